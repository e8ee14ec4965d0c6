/// Console rendering for progress lines and ranked listings.
pub mod formatting;
