//! Start-with-the-OS registration.

use auto_launch::{AutoLaunch, AutoLaunchBuilder};
use tracing::info;

use crate::Error;

pub struct LoginItem {
    launcher: AutoLaunch,
}

impl LoginItem {
    /// Login item pointing at the running executable.
    pub fn for_current_exe(app_name: &str) -> Result<Self, Error> {
        let exe = std::env::current_exe()?;
        let exe = exe
            .to_str()
            .ok_or_else(|| Error::Autostart("executable path is not valid UTF-8".to_string()))?;

        let launcher = AutoLaunchBuilder::new()
            .set_app_name(app_name)
            .set_app_path(exe)
            .set_use_launch_agent(true)
            .build()
            .map_err(|e| Error::Autostart(e.to_string()))?;

        Ok(Self { launcher })
    }

    pub fn is_enabled(&self) -> Result<bool, Error> {
        self.launcher
            .is_enabled()
            .map_err(|e| Error::Autostart(e.to_string()))
    }

    /// Register or unregister, then report the state the OS now holds.
    pub fn set_enabled(&self, enabled: bool) -> Result<bool, Error> {
        let result = if enabled {
            self.launcher.enable()
        } else {
            self.launcher.disable()
        };
        result.map_err(|e| Error::Autostart(e.to_string()))?;

        info!(enabled, "startup registration changed");
        self.is_enabled()
    }
}
