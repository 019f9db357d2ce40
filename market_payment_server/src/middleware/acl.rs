//! Access control list middleware for the marketplace payment server.
//! This middleware can be placed on any route or service.
//!
//! It reads the caller identity from the request headers and checks the caller's role against the roles permitted
//! on the route. If the caller holds any one of the permitted roles the request continues. Otherwise a `403
//! Forbidden` response is returned, or `401 Unauthorized` if there is no identity at all.

use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{Identity, Role},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    permitted_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(permitted_roles: &[Role]) -> Self {
        AclMiddlewareFactory { permitted_roles: permitted_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { permitted_roles: self.permitted_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    permitted_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let permitted_roles = self.permitted_roles.clone();
        Box::pin(async move {
            let identity = Identity::from_headers(req.headers()).map_err(ServerError::from)?;
            if permitted_roles.contains(&identity.role) {
                service.call(req).await
            } else {
                warn!("💻️ {} {} is not permitted on {}", identity.role, identity.user_id, req.path());
                let allowed = permitted_roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
                Err(ServerError::from(AuthError::InsufficientPermissions(format!("Requires one of: {allowed}"))).into())
            }
        })
    }
}
