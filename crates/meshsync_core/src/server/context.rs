use std::path::PathBuf;
use std::sync::Arc;

use crate::refine::{refine_outgoing, refine_settings_for, Refiner};
use crate::server::state::ServerState;
use crate::types::{Entity, GetMessage, Scene};

/// Host-side access to server state while a message is being handled.
///
/// Handed to the `Server::poll` callback; the server lock is held for its
/// whole lifetime.
pub struct ServeContext<'a> {
    state: &'a mut ServerState,
    refiner: &'a dyn Refiner,
}

impl<'a> ServeContext<'a> {
    pub(crate) fn new(state: &'a mut ServerState, refiner: &'a dyn Refiner) -> Self {
        Self { state, refiner }
    }

    /// The get request currently being handled, if any.
    pub fn current_get(&self) -> Option<&GetMessage> {
        self.state.current_get.as_deref().map(|get| &get.message)
    }

    /// Starts a fresh host scene for the current get request.
    ///
    /// Returns `false` (and changes nothing) when no get request is being handled.
    pub fn begin_serve(&mut self) -> bool {
        let Some(request) = self.state.current_get.as_ref() else {
            tracing::error!("begin_serve(): no get request is being handled");
            return false;
        };

        let scene_settings = request.message.scene_settings.clone();
        let refine = refine_settings_for(&request.message.refine_settings, &scene_settings);
        self.state.serve_settings = Some(refine);
        self.state.host_scene = Some(Scene::with_settings(scene_settings));
        true
    }

    /// Converts the host scene for the requesting client and releases it.
    ///
    /// Returns `false` (and changes nothing) when no get request is being
    /// handled or there is no host scene.
    pub fn end_serve(&mut self) -> bool {
        let Some(request) = self.state.current_get.clone() else {
            tracing::error!("end_serve(): no get request is being handled");
            return false;
        };
        let refine = self.state.serve_settings.unwrap_or_else(|| {
            refine_settings_for(
                &request.message.refine_settings,
                &request.message.scene_settings,
            )
        });
        let Some(scene) = self.state.host_scene.as_mut() else {
            tracing::error!("end_serve(): host scene is missing");
            return false;
        };

        refine_outgoing(scene, &refine, self.refiner);
        request.wait.complete();
        tracing::debug!(objects = scene.objects.len(), "served get request");
        true
    }

    /// The scene being assembled for the current get request.
    pub fn host_scene(&mut self) -> Option<&mut Scene> {
        self.state.host_scene.as_mut()
    }

    /// Supplies the image for the pending screenshot request.
    pub fn set_screenshot_path(&mut self, path: impl Into<PathBuf>) -> bool {
        self.state.set_screenshot_path(path.into())
    }

    pub fn entity(&self, path: &str) -> Option<&Arc<Entity>> {
        self.state.entities.get(path)
    }

    /// Every object currently known from the client, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> + '_ {
        self.state.entities.values()
    }
}
