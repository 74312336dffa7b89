// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// Locale used when no feature or environment override is present.
const FALLBACK_LOCALE: &str = "en";

fn main() {
    let locale = select_locale();
    println!("cargo:rustc-env=ASCEND_LANG_EFFECTIVE={}", locale);

    println!("cargo:rerun-if-env-changed=ASCEND_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // English is always loaded first so every key has a value.
    let mut messages = load_locale(FALLBACK_LOCALE)
        .unwrap_or_else(|| panic!("Failed to read locales/{}.toml", FALLBACK_LOCALE));

    if locale != FALLBACK_LOCALE {
        match load_locale(&locale) {
            Some(overrides) => messages.extend(overrides),
            None => println!(
                "cargo:warning=Locale file 'locales/{}.toml' not found. Falling back to '{}'.",
                locale, FALLBACK_LOCALE
            ),
        }
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is always set for build scripts");
    let dest_path = Path::new(&out_dir).join("translations.rs");
    fs::write(&dest_path, render_macro(&messages)).expect("Failed to write translations.rs");
}

/// Picks the locale: a `lang_*` feature wins, then `ASCEND_LANG`, then English.
fn select_locale() -> String {
    let mut requested: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    requested.sort();

    match requested.first() {
        Some(first) => {
            if requested.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    requested, first
                );
            }
            first.clone()
        }
        None => env::var("ASCEND_LANG").unwrap_or_else(|_| FALLBACK_LOCALE.to_string()),
    }
}

/// Reads `locales/<locale>.toml`, a flat table of quoted keys to messages.
fn load_locale(locale: &str) -> Option<BTreeMap<String, String>> {
    let path = format!("locales/{}.toml", locale);
    let content = fs::read_to_string(&path).ok()?;
    let table = toml::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", path, e));
    Some(table)
}

/// Generates the `t!` macro: one literal arm per key, and a compile error for unknown keys.
fn render_macro(messages: &BTreeMap<String, String>) -> String {
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in messages {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    code.push('}');
    code
}
