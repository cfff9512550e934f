//! HTTP middleware for Campus Core.

pub mod auth;

pub use auth::{
    AuthConfig, AuthContext, AuthError, AuthLayer, AuthService, Claims, TokenService,
};
