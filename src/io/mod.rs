/// CSV export of payback timelines and scenario comparisons.
pub mod export;
