//! Resolving setting values from config, environment and the store

use crate::config::{AppConfig, InjectedConfig};
use crate::error::Result;
use crate::registry::Settings;
use crate::store::SettingStore;

use log::{debug, info};
use serde_json::Value;

impl<S: SettingStore> Settings<S> {
    /// Resolve settings from host config and environment variables.
    ///
    /// Config sources are merged into `app` first, later ones winning:
    ///
    /// 1. the Docker config file under the app root if it exists, otherwise
    ///    the default config file if that exists
    /// 2. the file named by the conf env var (`FLASK_CONF` by default)
    /// 3. `injected`
    ///
    /// Then, for every registered setting `name`, the raw value is taken from
    /// `NAME_FILE` (file content), else `NAME`, else `app["NAME"]`. A value
    /// found this way is converted, stored, flagged as loaded from the
    /// environment, and written back to `app["NAME"]`.
    ///
    /// Returns the number of settings resolved.
    ///
    /// # Errors
    ///
    /// - [`Error::ConflictingEnvironment`](crate::Error::ConflictingEnvironment)
    ///   if both `NAME` and `NAME_FILE` are set
    /// - config file read/parse errors
    /// - conversion errors
    /// - [`Error::InvalidSettingValue`](crate::Error::InvalidSettingValue) if a
    ///   variable isn't valid UTF-8
    ///
    /// Every setting is resolved and converted before any is applied, so on
    /// error no setting is changed and no resolved value is written back.
    /// Values merged from config files stay in `app`.
    pub fn load_environment(
        &mut self,
        app: &mut AppConfig,
        injected: Option<InjectedConfig>,
    ) -> Result<usize> {
        self.merge_config_sources(app, injected)?;

        let mut names: Vec<String> = self.cache.keys().cloned().collect();
        names.sort_unstable();

        let mut resolved = Vec::new();
        for name in names {
            let env_name = name.to_uppercase();

            let mut current = app.get(&env_name).cloned();
            if let Some(raw) = self.env.lookup(&env_name)? {
                current = Some(Value::String(raw));
            }

            let Some(raw) = current.filter(|v| !v.is_null()) else {
                continue;
            };

            let value = self.convert_type(&name, raw)?;
            resolved.push((name, env_name, value));
        }

        let count = resolved.len();
        for (name, env_name, value) in resolved {
            app.insert(env_name, value.clone());
            if let Some(setting) = self.cache.get_mut(&name) {
                setting.mark_environment(value);
            }
            debug!("Setting {name} loaded from the environment");
        }

        info!("Loaded {count} settings from the environment");
        Ok(count)
    }

    fn merge_config_sources(
        &self,
        app: &mut AppConfig,
        injected: Option<InjectedConfig>,
    ) -> Result<()> {
        let docker = app.root_path().join(&self.files.docker);
        let default = app.root_path().join(&self.files.default);

        if docker.is_file() {
            app.load_file(&docker)?;
        } else if default.is_file() {
            app.load_file(&default)?;
        } else {
            debug!(
                "No {} or {} under {}",
                self.files.docker,
                self.files.default,
                app.root_path().display()
            );
        }

        if let Some(path) = self.env.var(&self.files.conf_env_var)? {
            debug!("Loading config from {}={path}", self.files.conf_env_var);
            app.load_file(&path)?;
        }

        match injected {
            Some(InjectedConfig::Map(values)) => app.update(values),
            Some(InjectedConfig::File(path)) => {
                app.load_file(&path)?;
            }
            None => {}
        }

        Ok(())
    }

    /// Apply stored values to settings not already loaded.
    ///
    /// Records for unregistered names are skipped, and so are settings that
    /// already have a value from [`Settings::load_environment`]. Returns the
    /// number of settings updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read or a stored value can't
    /// be converted to its setting's kind.
    pub fn load_database(&mut self) -> Result<usize> {
        let records = self.store.all()?;

        let mut applied = 0;
        for record in records {
            match self.cache.get(&record.name) {
                None => {
                    debug!("Ignoring stored value for unknown setting {}", record.name);
                    continue;
                }
                Some(setting) if setting.is_loaded() => continue,
                Some(_) => {}
            }

            let name = record.name.clone();
            let value = self.convert_record(record)?;
            if let Some(setting) = self.cache.get_mut(&name) {
                setting.mark_loaded(value);
            }
            applied += 1;
        }

        info!("Loaded {applied} settings from the {} store", self.store.backend_name());
        Ok(applied)
    }
}
