#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("not enough correspondences for a homography: found {found}, need at least {required}")]
    InsufficientMatches { found: usize, required: usize },
    #[error("homography fit is degenerate")]
    DegenerateTransform,
    #[error("match index {index} out of range (query has {query_len} keypoints, reference has {train_len})")]
    InvalidMatchIndex {
        index: usize,
        query_len: usize,
        train_len: usize,
    },
    #[error("point set sizes differ: {src} source points, {dst} destination points")]
    MismatchedPoints { src: usize, dst: usize },
}

pub type GeometryResult<T> = Result<T, GeometryError>;
