//! Robust homography estimation and patch localization.
//!
//! [`RansacEstimator`] implements [`starloc_core::TransformEstimator`] with
//! minimal four-point samples and a normalized DLT refit; [`localize`] turns a
//! match list into the projected corners of the query patch.

mod dlt;
mod error;
mod localize;
mod ransac;

pub use dlt::{collinear, degenerate_quad, estimate_dlt, homography_from_4pt};
pub use error::{GeometryError, GeometryResult};
pub use localize::{correspondences, localize, Localization};
pub use ransac::{count_inliers, RansacEstimator, MIN_CORRESPONDENCES};
