use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::refine::RefineSettings;
use crate::server::message::{GetRequest, Message, ScreenshotRequest};
use crate::types::{Entity, Scene};

/// Everything guarded by the server lock.
#[derive(Debug, Default)]
pub(crate) struct ServerState {
    /// Most recent object reported for each path.
    pub entities: HashMap<String, Arc<Entity>>,
    /// Received messages not yet seen by the host.
    pub history: Vec<Message>,
    pub host_scene: Option<Scene>,
    pub current_get: Option<Arc<GetRequest>>,
    /// Refine settings derived for `current_get` by `begin_serve`.
    pub serve_settings: Option<RefineSettings>,
    pub current_screenshot: Option<Arc<ScreenshotRequest>>,
    pub screenshot_path: Option<PathBuf>,
}

impl ServerState {
    pub fn clear(&mut self) {
        self.entities.clear();
        self.history.clear();
        self.host_scene = None;
    }

    /// Bookkeeping after the host has handled `message`.
    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::Set(set) => {
                for obj in &set.scene.objects {
                    self.entities.insert(obj.path.clone(), Arc::clone(obj));
                }
            }
            Message::Delete(delete) => {
                for id in &delete.targets {
                    self.entities.remove(&id.path);
                }
            }
            _ => {}
        }
    }

    pub fn set_screenshot_path(&mut self, path: PathBuf) -> bool {
        match &self.current_screenshot {
            Some(request) => {
                self.screenshot_path = Some(path);
                request.wait.complete();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeleteMessage, Identifier, ScreenshotMessage, SetMessage};

    fn set_of(paths: &[&str]) -> Message {
        let mut message = SetMessage::default();
        for path in paths {
            message.scene.insert(Entity::transform(*path));
        }
        Message::Set(message)
    }

    #[test]
    fn test_apply_set_is_last_write_wins() {
        let mut state = ServerState::default();
        state.apply(&set_of(&["/a", "/b"]));

        let mut second = SetMessage::default();
        let mut replacement = Entity::transform("/a");
        replacement.id = 7;
        second.scene.insert(replacement);
        state.apply(&Message::Set(second));

        assert_eq!(state.entities.len(), 2);
        assert_eq!(state.entities["/a"].id, 7);
    }

    #[test]
    fn test_apply_delete_removes_targets() {
        let mut state = ServerState::default();
        state.apply(&set_of(&["/a", "/b"]));
        state.apply(&Message::Delete(DeleteMessage {
            targets: vec![Identifier::new("/a"), Identifier::new("/missing")],
        }));

        assert!(!state.entities.contains_key("/a"));
        assert!(state.entities.contains_key("/b"));
    }

    #[test]
    fn test_clear_empties_state() {
        let mut state = ServerState::default();
        state.apply(&set_of(&["/a"]));
        state.history.push(set_of(&["/b"]));
        state.host_scene = Some(Scene::default());

        state.clear();
        assert!(state.entities.is_empty());
        assert!(state.history.is_empty());
        assert!(state.host_scene.is_none());
    }

    #[test]
    fn test_screenshot_path_requires_request() {
        let mut state = ServerState::default();
        assert!(!state.set_screenshot_path(PathBuf::from("shot.png")));
        assert!(state.screenshot_path.is_none());

        let request = Arc::new(ScreenshotRequest::new(ScreenshotMessage {}));
        state.current_screenshot = Some(Arc::clone(&request));
        assert!(state.set_screenshot_path(PathBuf::from("shot.png")));
        assert!(request.is_complete());
        assert_eq!(state.screenshot_path, Some(PathBuf::from("shot.png")));
    }
}
