use pkg_kubectl::ClusterError;

pub type Result<T> = std::result::Result<T, RbacError>;

#[derive(Debug, thiserror::Error)]
pub enum RbacError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not managed by this service; refusing to modify it")]
    NotManaged(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("kubectl failed: {0}")]
    Execution(#[source] ClusterError),

    #[error("token secret {secret} was not populated after {attempts} attempts")]
    TokenUnavailable { secret: String, attempts: u32 },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("cluster configuration unusable: {0}")]
    ClusterConfig(String),

    #[error("unexpected object shape: {0}")]
    Decode(String),
}

impl From<ClusterError> for RbacError {
    fn from(err: ClusterError) -> Self {
        match err {
            ClusterError::NotFound(what) => RbacError::NotFound(what),
            ClusterError::AlreadyExists(what) => RbacError::AlreadyExists(what),
            ClusterError::Decode(msg) => RbacError::Decode(msg),
            other => RbacError::Execution(other),
        }
    }
}

