//! Review listing and submission.

// self
use crate::{
	_prelude::*,
	api::{HeroClient, NewReview, Review, ReviewReceipt, UserId},
	http::{ApiRequest, SessionTransport},
	obs::{self, SessionOp},
};

impl<T> HeroClient<T>
where
	T: ?Sized + SessionTransport,
{
	/// Lists every review; the body must be a JSON array.
	pub async fn fetch_reviews(&self) -> Result<Vec<Review>> {
		obs::observe(SessionOp::Request, "fetch_reviews", async move {
			self.gated_json(ApiRequest::get(self.endpoints.reviews.clone())).await
		})
		.await
	}

	/// Submits a validated review.
	pub async fn create_review(&self, review: &NewReview) -> Result<ReviewReceipt> {
		obs::observe(SessionOp::Request, "create_review", async move {
			let request = ApiRequest::post(self.endpoints.reviews.clone()).with_json(review)?;

			self.gated_json(request).await
		})
		.await
	}

	/// Reviews a colleague as the current user (taken from the cache, fetched when missing).
	pub async fn review_colleague(
		&self,
		recipient: &UserId,
		positive: &str,
		negative: Option<&str>,
	) -> Result<ReviewReceipt> {
		let author = match self.identity.load().await?.user {
			Some(user) => user,
			None => self.fetch_user().await?,
		};
		let review = NewReview::new(author.id, recipient.clone(), positive, negative)?;

		self.create_review(&review).await
	}
}
