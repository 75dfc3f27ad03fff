/// Configuration macros
///
/// `config_struct!` declares a section struct together with its defaults, so a
/// field, its type and its default value live on one line.

/// Define a configuration section with embedded defaults
///
/// Generates the struct with public fields, a `Default` implementation built
/// from the declared values, and serde support with `#[serde(default)]` so a
/// partially written TOML section falls back field by field.
///
/// # Example
/// ```
/// fundsu::config_struct! {
///     pub struct FetcherConfig {
///         signature_limit: usize = 200,
///         batch_delay_ms: u64 = 100,
///     }
/// }
///
/// assert_eq!(FetcherConfig::default().signature_limit, 200);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
