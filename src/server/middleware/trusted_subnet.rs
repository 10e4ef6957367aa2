//! Trusted subnet gating for ingestion routes

use crate::core::security::TrustedSubnet;
use crate::server::middleware::helpers::{client_ip, is_ingestion_route};
use crate::utils::error::MetricsError;
use actix_web::ResponseError;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

/// Rejects ingestion requests whose client address is outside the subnet
///
/// With no subnet configured every request passes.
#[derive(Debug, Clone, Default)]
pub struct TrustedSubnetMiddleware {
    subnet: Option<TrustedSubnet>,
}

impl TrustedSubnetMiddleware {
    pub fn new(subnet: Option<TrustedSubnet>) -> Self {
        Self { subnet }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustedSubnetMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = TrustedSubnetMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedSubnetMiddlewareService {
            service,
            subnet: self.subnet,
        }))
    }
}

/// Service implementation for trusted subnet middleware
pub struct TrustedSubnetMiddlewareService<S> {
    service: S,
    subnet: Option<TrustedSubnet>,
}

impl<S, B> Service<ServiceRequest> for TrustedSubnetMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let allowed = match self.subnet {
            Some(subnet) if is_ingestion_route(req.path()) => {
                let ip = client_ip(req.headers());
                let allowed = ip.is_some_and(|ip| subnet.contains(ip));
                if !allowed {
                    warn!(
                        client = ?ip,
                        subnet = %subnet,
                        path = %req.path(),
                        "Rejected request from outside the trusted subnet"
                    );
                }
                allowed
            }
            _ => true,
        };

        if !allowed {
            let error = MetricsError::forbidden("Client address is not in the trusted subnet");
            let response = req.into_response(error.error_response()).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
