//! Name-to-factory camera table.

use super::{Camera, FollowCam, FreeCam, OrthoCam, SOrthoCam};
use crate::error::ViewError;
use crate::prefs::Prefs;
use std::collections::HashMap;

pub type CameraFactory = fn(&[String]) -> Result<Box<dyn Camera>, ViewError>;

fn no_args(args: &[String]) -> Result<(), ViewError> {
    match args.first() {
        None => Ok(()),
        Some(a) => Err(ViewError::Config(format!(
            "unknown camera option {a:?}"
        ))),
    }
}

pub struct CameraRegistry {
    by_name: HashMap<&'static str, CameraFactory>,
}

impl CameraRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self {
            by_name: HashMap::new(),
        };
        reg.register("follow", |args| {
            no_args(args)?;
            Ok(Box::new(FollowCam::new()))
        });
        reg.register("free", |args| {
            no_args(args)?;
            Ok(Box::new(FreeCam::new()))
        });
        reg.register("ortho", |args| Ok(Box::new(SOrthoCam::from_args(args)?)));
        reg.register("fixed", |args| Ok(Box::new(OrthoCam::from_args(args)?)));
        reg
    }

    pub fn register(&mut self, name: &'static str, factory: CameraFactory) {
        self.by_name.insert(name, factory);
    }

    pub fn make(&self, name: &str, args: &[String]) -> Result<Box<dyn Camera>, ViewError> {
        let factory = self
            .by_name
            .get(name)
            .ok_or_else(|| ViewError::Config(format!("no such camera: {name}")))?;
        factory(args)
    }

    /// Rebuild the persisted camera, falling back to the default on any
    /// configuration problem.
    pub fn restore(&self, prefs: &Prefs) -> Box<dyn Camera> {
        if let Some(name) = &prefs.defcam {
            match self.make(name, &prefs.camargs) {
                Ok(cam) => return cam,
                Err(e) => {
                    log::warn!(target: "mapview", "restoring camera {name:?}: {e}; using default")
                }
            }
        }
        Box::new(SOrthoCam::new(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        let reg = CameraRegistry::with_defaults();
        for name in ["follow", "free", "ortho", "fixed"] {
            assert!(reg.make(name, &[]).is_ok(), "{name}");
        }
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let reg = CameraRegistry::with_defaults();
        assert!(matches!(
            reg.make("topdown", &[]),
            Err(ViewError::Config(_))
        ));
    }

    #[test]
    fn restore_falls_back_on_bad_prefs() {
        let reg = CameraRegistry::with_defaults();
        let prefs = Prefs {
            defcam: Some("topdown".into()),
            ..Prefs::default()
        };
        // Must not error; the default camera takes over.
        let _cam = reg.restore(&prefs);
        let prefs = Prefs {
            defcam: Some("follow".into()),
            camargs: vec!["-z".into()],
            ..Prefs::default()
        };
        let _cam = reg.restore(&prefs);
    }
}
