/// Service configuration loaded from environment variables.
///
/// Implementors derive `serde::Deserialize`; field `foo_bar` is read from
/// `FOO_BAR`. `Vec<String>` fields accept comma-separated values.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Load from an explicit set of variables instead of the process environment.
    fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
