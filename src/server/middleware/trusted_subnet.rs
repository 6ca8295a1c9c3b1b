//! Trusted subnet filter
//!
//! When a subnet is configured, requests are only served if the client
//! address (the `X-Real-IP` header, else the socket peer) lies inside it.

use crate::utils::net::{REAL_IP_HEADER, ip_in_subnet};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures::future::{Ready, ready};
use ipnet::IpNet;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

/// Subnet filter middleware for Actix-web
#[derive(Debug, Clone, Default)]
pub struct TrustedSubnet {
    subnet: Option<IpNet>,
}

impl TrustedSubnet {
    /// `None` lets every request through
    pub fn new(subnet: Option<IpNet>) -> Self {
        Self { subnet }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustedSubnet
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = TrustedSubnetService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedSubnetService {
            service,
            subnet: self.subnet,
        }))
    }
}

/// Service implementation for the subnet filter
pub struct TrustedSubnetService<S> {
    service: S,
    subnet: Option<IpNet>,
}

impl<S, B> Service<ServiceRequest> for TrustedSubnetService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(subnet) = self.subnet else {
            return Box::pin(self.service.call(req));
        };

        let ip = client_ip(&req);
        if !ip.as_deref().is_some_and(|ip| ip_in_subnet(ip, &subnet)) {
            warn!(
                "Rejected {} {} from {}: outside trusted subnet {}",
                req.method(),
                req.path(),
                ip.as_deref().unwrap_or("unknown"),
                subnet
            );
            return Box::pin(async move {
                Err(actix_web::error::ErrorForbidden(
                    "client address is not in the trusted subnet",
                ))
            });
        }

        Box::pin(self.service.call(req))
    }
}

/// Client address as reported by `X-Real-IP`, falling back to the peer
pub fn client_ip(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(REAL_IP_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}
