use serde::{Deserialize, Serialize};

/// Star rating in half-star steps, 0.5 through 5.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Rating(u8);

impl Rating {
	pub const MAX: Rating = Rating(10);

	/// `full` whole stars plus an optional half star.
	pub fn from_stars(full: u8, half: bool) -> Option<Self> {
		let halves = full.checked_mul(2)? + u8::from(half);
		(1..=10).contains(&halves).then_some(Self(halves))
	}

	/// Nearest half step to `value`.
	pub fn from_value(value: f64) -> Option<Self> {
		if !value.is_finite() {
			return None;
		}
		let halves = (value * 2.0).round();
		(1.0..=10.0)
			.contains(&halves)
			.then_some(Self(halves as u8))
	}

	/// Counts `★` and `½` glyphs, e.g. `"★★★½"`.
	pub fn from_glyphs(text: &str) -> Option<Self> {
		let full = text.chars().filter(|&c| c == '★').count();
		let half = text.contains('½');
		Self::from_stars(u8::try_from(full).ok()?, half)
	}

	pub fn value(self) -> f32 {
		f32::from(self.0) / 2.0
	}

	pub fn is_max(self) -> bool {
		self == Self::MAX
	}

	pub fn glyphs(self) -> String {
		let mut out = "★".repeat(usize::from(self.0 / 2));
		if self.0 % 2 == 1 {
			out.push('½');
		}
		out
	}
}

impl TryFrom<f32> for Rating {
	type Error = String;

	fn try_from(value: f32) -> Result<Self, Self::Error> {
		Self::from_value(f64::from(value)).ok_or_else(|| format!("rating out of range: {value}"))
	}
}

impl From<Rating> for f32 {
	fn from(rating: Rating) -> Self {
		rating.value()
	}
}

/// Standout when the rating is maximal or the interaction count is strictly
/// above the provider's threshold.
pub fn is_standout(
	rating: Option<Rating>,
	interactions: Option<u64>,
	threshold: Option<u64>,
) -> bool {
	let top_rated = rating.is_some_and(Rating::is_max);
	let heavy_use = matches!((interactions, threshold), (Some(count), Some(limit)) if count > limit);
	top_rated || heavy_use
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stars_and_halves() {
		assert_eq!(Rating::from_stars(4, true).map(Rating::value), Some(4.5));
		assert_eq!(Rating::from_stars(0, true).map(Rating::value), Some(0.5));
		assert_eq!(Rating::from_stars(5, false), Some(Rating::MAX));
		assert_eq!(Rating::from_stars(0, false), None);
		assert_eq!(Rating::from_stars(5, true), None);
		assert_eq!(Rating::from_stars(6, false), None);
	}

	#[test]
	fn glyph_parsing() {
		assert_eq!(Rating::from_glyphs("★★★½").map(Rating::value), Some(3.5));
		assert_eq!(Rating::from_glyphs("½").map(Rating::value), Some(0.5));
		assert_eq!(Rating::from_glyphs("no stars"), None);
		assert_eq!(Rating::from_stars(3, true).map(Rating::glyphs).as_deref(), Some("★★★½"));
	}

	#[test]
	fn values_round_to_half_steps() {
		assert_eq!(Rating::from_value(4.5).map(Rating::value), Some(4.5));
		assert_eq!(Rating::from_value(3.8).map(Rating::value), Some(4.0));
		assert_eq!(Rating::from_value(0.0), None);
		assert_eq!(Rating::from_value(f64::NAN), None);
		assert_eq!(Rating::from_value(7.0), None);
	}

	#[test]
	fn serde_as_float() {
		let rating = Rating::from_stars(2, true).unwrap();
		assert_eq!(serde_json::to_string(&rating).unwrap(), "2.5");
		assert_eq!(serde_json::from_str::<Rating>("2.5").unwrap(), rating);
		assert!(serde_json::from_str::<Rating>("9").is_err());
	}

	#[test]
	fn standout_boundaries() {
		let five = Rating::from_stars(5, false);
		let four_half = Rating::from_stars(4, true);
		assert!(is_standout(five, None, None));
		assert!(!is_standout(four_half, None, None));
		assert!(!is_standout(four_half, Some(500), Some(500)));
		assert!(is_standout(four_half, Some(501), Some(500)));
		assert!(!is_standout(None, Some(10_000), None));
	}
}
