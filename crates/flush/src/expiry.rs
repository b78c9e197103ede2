//! Lazily evaluated expiration conditions for queued work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Shared one-way flag. Once set, every [`Expiry::flag`] built from it reports expired.
#[derive(Debug, Clone, Default)]
pub struct ExpiryFlag(Arc<AtomicBool>);

impl ExpiryFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn expire(&self) {
		self.0.store(true, Ordering::Release);
	}

	pub fn is_set(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Predicate consulted whenever the queue scans an item.
///
/// Evaluated with the queue lock held: predicates must stay cheap and must
/// not call back into the queue.
#[derive(Clone, Default)]
pub struct Expiry(Kind);

#[derive(Clone, Default)]
enum Kind {
	#[default]
	Never,
	When(Arc<dyn Fn() -> bool + Send + Sync>),
	Token(CancellationToken),
	Flag(ExpiryFlag),
	AnyOf(Arc<(Expiry, Expiry)>),
}

impl Expiry {
	pub fn never() -> Self {
		Self(Kind::Never)
	}

	pub fn when(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
		Self(Kind::When(Arc::new(predicate)))
	}

	/// Expires once `token` is cancelled.
	pub fn on_cancel(token: CancellationToken) -> Self {
		Self(Kind::Token(token))
	}

	pub fn flag(flag: &ExpiryFlag) -> Self {
		Self(Kind::Flag(flag.clone()))
	}

	pub fn any_of(a: Expiry, b: Expiry) -> Self {
		match (a.0, b.0) {
			(Kind::Never, other) | (other, Kind::Never) => Self(other),
			(a, b) => Self(Kind::AnyOf(Arc::new((Self(a), Self(b))))),
		}
	}

	pub fn is_expired(&self) -> bool {
		match &self.0 {
			Kind::Never => false,
			Kind::When(predicate) => predicate(),
			Kind::Token(token) => token.is_cancelled(),
			Kind::Flag(flag) => flag.is_set(),
			Kind::AnyOf(pair) => pair.0.is_expired() || pair.1.is_expired(),
		}
	}

	pub fn is_never(&self) -> bool {
		matches!(self.0, Kind::Never)
	}
}

impl std::fmt::Debug for Expiry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.0 {
			Kind::Never => f.write_str("Never"),
			Kind::When(_) => f.write_str("When(..)"),
			Kind::Token(token) => f.debug_tuple("Token").field(&token.is_cancelled()).finish(),
			Kind::Flag(flag) => f.debug_tuple("Flag").field(&flag.is_set()).finish(),
			Kind::AnyOf(pair) => f.debug_tuple("AnyOf").field(&pair.0).field(&pair.1).finish(),
		}
	}
}
