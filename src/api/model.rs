//! Wire models for accounts, colleagues, and reviews.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use time::format_description::well_known::{Rfc2822, Rfc3339};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		///
		/// The backend emits identifiers as strings or bare integers; both decode to the same
		/// textual form.
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "RawId", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<RawId> for $name {
			type Error = IdentifierError;

			fn try_from(value: RawId) -> Result<Self, Self::Error> {
				match value {
					RawId::Text(text) => Self::new(text),
					RawId::Number(number) => Ok(Self(number.to_string())),
				}
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 64;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, review).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (user, review).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (user, review).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
	Text(String),
	Number(i64),
}

def_id! { UserId, "Identifier of a registered user (colleague).", "User" }
def_id! { ReviewId, "Identifier of a stored review.", "Review" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

/// Email + password pair submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Plain-text password, only ever sent over the wire.
	pub password: String,
}
impl Credentials {
	/// Builds credentials, trimming the email the way the login form does.
	pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
		Self { email: email.as_ref().trim().to_owned(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Registration form payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
	/// Account email.
	pub email: String,
	/// Plain-text password.
	pub password: String,
	/// Display name.
	pub name: String,
}
impl Registration {
	/// Builds a registration payload with trimmed email and name.
	pub fn new(
		email: impl AsRef<str>,
		password: impl Into<String>,
		name: impl AsRef<str>,
	) -> Self {
		Self {
			email: email.as_ref().trim().to_owned(),
			password: password.into(),
			name: name.as_ref().trim().to_owned(),
		}
	}
}
impl Debug for Registration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registration")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("name", &self.name)
			.finish()
	}
}

/// Identity of the logged-in user as returned by `GET me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
	/// User identifier.
	pub id: UserId,
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Role label (`colleague`, ...).
	#[serde(default)]
	pub role: Option<String>,
	/// Account creation timestamp as sent by the server.
	#[serde(default)]
	pub created_at: Option<String>,
}

/// Entry of the colleague list returned by `GET users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colleague {
	/// User identifier.
	pub id: UserId,
	/// Display name.
	pub name: String,
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
}

/// Stored review as returned by `GET reviews`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
	/// Review identifier.
	pub id: ReviewId,
	/// What the colleague does well.
	pub positive: String,
	/// What the colleague could improve.
	#[serde(default)]
	pub negative: Option<String>,
	/// Reviewed colleague.
	#[serde(alias = "adresed_id")]
	pub recipient_id: UserId,
	/// Reviewed colleague's display name.
	#[serde(alias = "adresed_name")]
	pub recipient_name: String,
	/// Review author.
	pub author_id: UserId,
	/// Author's display name.
	pub author_name: String,
	/// Creation timestamp as sent by the server.
	pub created_at: String,
}
impl Review {
	/// Parses [`Review::created_at`] as RFC 3339 or RFC 2822 (Flask's default date format).
	pub fn created_at(&self) -> Option<OffsetDateTime> {
		let raw = self.created_at.trim();

		OffsetDateTime::parse(raw, &Rfc3339).or_else(|_| OffsetDateTime::parse(raw, &Rfc2822)).ok()
	}
}

/// Validation failures for [`NewReview`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ReviewValidationError {
	/// The positive section is empty.
	#[error("A review needs a non-empty positive section.")]
	EmptyPositive,
	/// Author and recipient are the same user.
	#[error("Users cannot review themselves.")]
	SelfReview,
}

/// Review submission payload for `POST reviews`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewReview {
	/// What the colleague does well.
	pub positive: String,
	/// What the colleague could improve.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub negative: Option<String>,
	/// Reviewed colleague.
	#[serde(rename = "adresed_id")]
	pub recipient_id: UserId,
	/// Review author.
	pub author_id: UserId,
}
impl NewReview {
	/// Validates and builds a review; blank `negative` text is dropped.
	pub fn new(
		author_id: UserId,
		recipient_id: UserId,
		positive: impl AsRef<str>,
		negative: Option<&str>,
	) -> Result<Self, ReviewValidationError> {
		let positive = positive.as_ref().trim();

		if positive.is_empty() {
			return Err(ReviewValidationError::EmptyPositive);
		}
		if author_id == recipient_id {
			return Err(ReviewValidationError::SelfReview);
		}

		let negative = negative.map(str::trim).filter(|text| !text.is_empty()).map(str::to_owned);

		Ok(Self { positive: positive.to_owned(), negative, recipient_id, author_id })
	}
}

/// Acknowledgement returned by `POST reviews`.
///
/// The backend answers `{"message": ...}`; deployments that echo the stored review send it either
/// flat (`{"id": ..., "positive": ..., ...}`) or nested under `review`. Both shapes are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct ReviewReceipt {
	/// Identifier of the created review, when echoed back.
	pub id: Option<ReviewId>,
	/// Server message.
	pub message: Option<String>,
	/// The stored review, when echoed back in full.
	pub review: Option<Review>,
}
impl TryFrom<serde_json::Value> for ReviewReceipt {
	type Error = serde_json::Error;

	fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
		let message = value.get("message").and_then(serde_json::Value::as_str).map(str::to_owned);
		let review = match value.get("review") {
			Some(nested) if !nested.is_null() => Some(Review::deserialize(nested)?),
			_ => Review::deserialize(&value).ok(),
		};
		let id = match &review {
			Some(review) => Some(review.id.clone()),
			None => match value.get("id") {
				Some(id) if !id.is_null() => Some(ReviewId::deserialize(id)?),
				_ => None,
			},
		};

		Ok(Self { id, message, review })
	}
}
