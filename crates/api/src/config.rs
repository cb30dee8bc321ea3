//! Types for use when configuring artifetch modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> AfResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| AfError::other_src("encode", e))?,
    )
    .map_err(|e| AfError::other_src("decode", e))
}

/// Denotes a type used to configure a specific artifetch module.
///
/// Note, the types defined with this trait are specifically for
/// configuration that cannot be changed at runtime, the likes of which
/// might be found in a configuration file.
///
/// If a specific module has a config that can be changed at runtime, the
/// component found in this type might be a `default_` prefixed version
/// of it, then the runtime value can be altered through different means.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
}

/// Artifetch configuration.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// When artifetch is generating a default or example configuration
    /// file, it will pass a mutable reference of this config struct to
    /// the module factories that are configured to be used. Those
    /// factories should call this function to add their default
    /// configuration parameters to that file.
    pub fn add_default_module_config<M: ModConfig>(
        &mut self,
        module_name: String,
    ) -> AfResult<()> {
        if self.0.contains_key(&module_name) {
            return Err(AfError::other(format!(
                "Refusing to overwrite conflicting module name: {module_name}"
            )));
        }
        self.0.insert(module_name, tc(&M::default())?);
        Ok(())
    }

    /// When artifetch is initializing, it will call the factory function
    /// for all of its modules with an immutable reference to this config
    /// struct. Each of those modules may choose to call this function
    /// to extract a module config. Note that this config may be loaded
    /// from disk and edited by humans, so the serialization on the module
    /// config should be tolerant to missing properties, setting sane
    /// defaults.
    pub fn get_module_config<M: ModConfig>(
        &self,
        module_name: &str,
    ) -> AfResult<M> {
        self.0
            .get(module_name)
            .map(tc)
            .unwrap_or_else(|| Ok(M::default()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_usage_example() {
        #[derive(
            Debug, Default, serde::Serialize, serde::Deserialize, PartialEq,
        )]
        struct Mod1 {
            #[serde(default)]
            p_a: u32,
            #[serde(default)]
            p_b: String,
        }

        impl ModConfig for Mod1 {}

        let mut config = Config::default();
        config
            .add_default_module_config::<Mod1>("mod1".into())
            .unwrap();

        // a second module under the same name is refused
        assert!(config
            .add_default_module_config::<Mod1>("mod1".into())
            .is_err());

        // ensure we can load a weird config from disk
        let config: Config = serde_json::from_str(
            r#"{
          "modBAD": { "foo": "bar" },
          "mod1": { "p_b": "test-p_b", "extra": "foo" }
        }"#,
        )
        .unwrap();

        assert_eq!(
            Mod1 {
                p_a: 0,
                p_b: "test-p_b".to_string(),
            },
            config.get_module_config::<Mod1>("mod1").unwrap(),
        );

        // unset mods get the default
        assert_eq!(
            Mod1 {
                p_a: 0,
                p_b: "".to_string(),
            },
            config.get_module_config::<Mod1>("NOT-SET").unwrap(),
        );
    }
}
