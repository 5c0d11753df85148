// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive cut session
//!
//! Holds the scene, the keys currently held down and the last mesh that was
//! rebuilt successfully. Kept free of JS types so it can be tested natively.

use planecut_geometry::{CutConfig, CutScene, Direction, MeshBuffers, Point3, Result};
use rustc_hash::FxHashSet;

/// Order in which held keys are applied on each tick
const MOVE_ORDER: [Direction; 4] = [
    Direction::Forward,
    Direction::Backward,
    Direction::Left,
    Direction::Right,
];

pub struct CutSession {
    scene: CutScene,
    config: CutConfig,
    held: FxHashSet<Direction>,
    mesh: MeshBuffers,
}

impl CutSession {
    /// Validate the config and build the first mesh
    pub fn new(scene: CutScene, config: CutConfig) -> Result<Self> {
        config.validate()?;
        let mesh = scene.rebuild(&config)?;
        Ok(Self {
            scene,
            config,
            held: FxHashSet::default(),
            mesh,
        })
    }

    /// Build a session with [`CutConfig::from_env`]. Hosts without process
    /// environment variables, such as the browser, get the defaults.
    pub fn with_env_config(scene: CutScene) -> Result<Self> {
        Self::new(scene, CutConfig::from_env())
    }

    pub fn scene(&self) -> &CutScene {
        &self.scene
    }

    pub fn config(&self) -> &CutConfig {
        &self.config
    }

    /// Last successfully rebuilt mesh
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// Mark a movement key as held. Returns false for keys that do not move
    /// the aperture.
    pub fn key_down(&mut self, key: &str) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.held.insert(direction);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.held.remove(&direction);
                true
            }
            None => false,
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    /// Apply every held key once, then rebuild if the aperture moved.
    /// Returns whether a new mesh was produced.
    pub fn tick(&mut self) -> Result<bool> {
        if self.held.is_empty() {
            return Ok(false);
        }
        let previous = self.scene.aperture;
        for direction in MOVE_ORDER {
            if self.held.contains(&direction) {
                self.scene.aperture.nudge(direction, self.config.move_step);
            }
        }
        if self.scene.aperture == previous {
            return Ok(false);
        }
        if let Err(err) = self.rebuild() {
            self.scene.aperture = previous;
            return Err(err);
        }
        Ok(true)
    }

    /// Move the aperture centre and rebuild. On failure both the previous
    /// centre and the previous mesh are kept.
    pub fn set_aperture_center(&mut self, center: Point3<f64>) -> Result<()> {
        let previous = self.scene.aperture.center;
        self.scene.aperture.center = center;
        if let Err(err) = self.rebuild() {
            self.scene.aperture.center = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Rebuild from the current scene, replacing the mesh only on success
    pub fn rebuild(&mut self) -> Result<()> {
        self.mesh = self.scene.rebuild(&self.config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planecut_geometry::Error;

    fn session() -> CutSession {
        CutSession::new(CutScene::default(), CutConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_mesh() {
        let session = session();
        assert_eq!(session.mesh().vertex_count(), 11);
        assert_eq!(session.mesh().triangle_count(), 7);
    }

    #[test]
    fn test_tick_without_keys_does_nothing() {
        let mut session = session();
        let before = session.mesh().clone();
        assert!(!session.tick().unwrap());
        assert_eq!(session.mesh(), &before);
    }

    #[test]
    fn test_held_keys_move_aperture() {
        let mut session = session();
        assert!(session.key_down("d"));
        assert!(session.key_down("Z"));
        assert!(!session.key_down("Shift"));
        assert!(session.is_held(Direction::Right));

        assert!(session.tick().unwrap());
        let center = session.scene().aperture.center;
        assert_relative_eq!(center.x, 1.01);
        assert_relative_eq!(center.z, 0.99);
        assert_relative_eq!(center.y, 0.1);

        session.key_up("d");
        session.key_up("z");
        assert!(!session.tick().unwrap());
        assert_relative_eq!(session.scene().aperture.center.x, 1.01);
    }

    #[test]
    fn test_layouts_share_directions() {
        let mut session = session();
        session.key_down("w");
        session.key_up("z");
        assert!(!session.is_held(Direction::Forward));
    }

    #[test]
    fn test_failed_move_keeps_last_mesh() {
        let mut session = session();
        let before = session.mesh().clone();

        let result = session.set_aperture_center(Point3::new(f64::NAN, 0.1, 1.0));
        assert!(matches!(result, Err(Error::InvalidGeometryInput(_))));
        assert_eq!(session.mesh(), &before);
        assert_eq!(session.scene().aperture.center, Point3::new(1.0, 0.1, 1.0));
    }

    #[test]
    fn test_set_center_rebuilds() {
        let mut session = session();
        session
            .set_aperture_center(Point3::new(5.0, 0.1, 5.0))
            .unwrap();
        assert_eq!(session.mesh().triangle_count(), 4);
        assert_eq!(session.mesh().vertex_count(), 8);
    }

    #[test]
    fn test_env_config_session() {
        let session = CutSession::with_env_config(CutScene::default()).unwrap();
        assert_eq!(session.config(), &CutConfig::from_env());
        assert_eq!(session.mesh().triangle_count(), 7);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CutConfig::default().with_move_step(-1.0);
        assert!(CutSession::new(CutScene::default(), config).is_err());
    }
}
