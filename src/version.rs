/// Version reported by `--version` and the startup log. Release builds can
/// stamp it through `WINDEXS_VERSION`; otherwise the crate version is used.
pub const VERSION: &str = match option_env!("WINDEXS_VERSION") {
    Some(stamped) if !stamped.is_empty() => stamped,
    _ => env!("CARGO_PKG_VERSION"),
};
