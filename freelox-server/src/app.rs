use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Settings, Storage};
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::services::{
    CommandDispatcher, DatagramTransport, DeviceRegistry, DiscoveryTracker, PublishRouter,
    UdpTransport,
};

pub async fn create_app(settings: &Arc<Settings>) -> Router {
    let storage = Arc::new(Storage::load(&settings.store).expect("Failed to load config store."));
    let (router, publisher) = build_app(settings, storage, Arc::new(UdpTransport));

    publisher.spawn_heartbeat(Duration::from_secs(settings.bridge.heartbeat_interval_secs));

    router
}

/// Wires every service and route; transport is injected so tests can
/// observe published datagrams.
pub fn build_app(
    settings: &Arc<Settings>,
    storage: Arc<Storage>,
    transport: Arc<dyn DatagramTransport>,
) -> (Router, Arc<PublishRouter>) {
    let registry = Arc::new(DeviceRegistry::new(
        storage.devices(),
        Duration::from_secs(settings.bridge.online_grace_secs),
    ));
    let discovery = Arc::new(DiscoveryTracker::new());
    let publisher = Arc::new(PublishRouter::new(
        storage.clone(),
        registry.clone(),
        transport,
        Duration::from_millis(settings.bridge.publish_timeout_ms),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        registry.clone(),
        Duration::from_secs(settings.bridge.command_timeout_secs),
    ));

    let token_state = TokenState {
        operator_token: Arc::from(settings.auth.token.as_str()),
        storage: storage.clone(),
    };

    let router = Router::new()
        .merge(ingress_router(IngressState {
            registry: registry.clone(),
            discovery: discovery.clone(),
            publisher: publisher.clone(),
        }))
        .merge(command_router(
            CommandState {
                dispatcher: dispatcher.clone(),
            },
            token_state.clone(),
        ))
        .merge(device_router(
            DeviceState {
                registry: registry.clone(),
            },
            token_state.clone(),
        ))
        .merge(discovery_router(
            DiscoveryState {
                discovery: discovery.clone(),
                registry: registry.clone(),
                storage: storage.clone(),
            },
            token_state.clone(),
        ))
        .merge(endpoint_router(
            EndpointState {
                storage: storage.clone(),
            },
            token_state.clone(),
        ))
        .merge(artifact_router(
            ArtifactState {
                registry,
                storage,
                settings: settings.clone(),
            },
            token_state,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    (router, publisher)
}
