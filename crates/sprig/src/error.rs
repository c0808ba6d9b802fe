// File: src/error.rs
// Purpose: Error taxonomy for mounting, directives and routing

use sprig_parser::DirectiveError;
use sprig_router::RouteError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A component was asked to render but supplies no template
    #[error("{component} does not supply a template")]
    TemplateMissing { component: String },

    /// A click directive names an action the owning component does not define
    #[error("unable to call action `{action}` on {component}")]
    HandlerMissing { action: String, component: String },

    /// A ref directive names a reference that was never created
    #[error("unable to bind ref `{id}`: the ref does not exist or has not been created yet")]
    RefNotFound { id: String },

    /// Nothing matched the location and no not-found route exists
    #[error("no route found for \"{0}\" and no not-found route is registered")]
    RouteNotFound(String),

    #[error("invalid route pattern \"{pattern}\": {reason}")]
    InvalidRoute { pattern: String, reason: String },

    #[error("unable to mount app to `#{0}`: the element does not exist in the document")]
    RootNotFound(String),

    #[error("component {0} is not registered")]
    ComponentNotRegistered(String),

    #[error("portal target `#{0}` does not exist in the document")]
    PortalTargetNotFound(String),

    #[error("router has no anchor to render into")]
    AnchorMissing,

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// The application's setup future failed
    #[error("setup failed: {0:#}")]
    Setup(anyhow::Error),
}

impl From<RouteError> for Error {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NotFound(path) => Error::RouteNotFound(path),
            RouteError::InvalidPattern { pattern, reason } => {
                Error::InvalidRoute { pattern, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_conversion() {
        let err: Error = RouteError::NotFound("/x/y".into()).into();
        assert!(matches!(err, Error::RouteNotFound(ref path) if path == "/x/y"));
        assert!(err.to_string().contains("/x/y"));
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = Error::HandlerMissing {
            action: "save".into(),
            component: "Counter".into(),
        };
        assert_eq!(err.to_string(), "unable to call action `save` on Counter");

        let err = Error::TemplateMissing {
            component: "HomePage".into(),
        };
        assert!(err.to_string().starts_with("HomePage"));
    }
}
