use super::client::Client;
use super::models::Listing;
use crate::Result;
use futures::stream::{self, Stream, TryStreamExt};
use ohno::app_err;

/// Walk a paginated listing as a lazy stream of items.
///
/// Pages are fetched one at a time, only when the consumer has drained the previous
/// one, by following each response's `rel="next"` link until a page has none. Every
/// fetch reports its quota signal to the client's rate governor. A failed fetch is
/// yielded as the stream's last item; items from earlier pages have already been
/// handed to the consumer by then. Dropping the stream stops the walk.
pub fn paginate<L>(client: &Client, first_url: String) -> impl Stream<Item = Result<L::Item>> + Send + '_
where
    L: Listing + Send,
    L::Item: Send,
{
    stream::try_unfold(Some(first_url), move |next| async move {
        let Some(url) = next else {
            return Ok::<_, ohno::AppError>(None);
        };

        let page = client
            .get_json::<L>(&url)
            .await?
            .ok_or_else(|| app_err!("listing '{url}' does not exist"))?;

        Ok(Some((page.data.into_items(), page.next)))
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, ohno::AppError>)))
    .try_flatten()
}
