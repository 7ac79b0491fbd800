// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和马来文（ms）
// 用途: 扫码站 / 告警列表面向操作员的提示语
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "ms"];

/// 默认语言（未配置或不支持时使用）
pub const DEFAULT_LOCALE: &str = "en";

/// 规范化语言代码，不支持的语言回退到 en
pub fn normalize_locale(locale: &str) -> &'static str {
    let lower = locale.trim().to_ascii_lowercase();
    SUPPORTED_LOCALES
        .iter()
        .copied()
        .find(|l| lower == *l || lower.starts_with(&format!("{}-", l)))
        .unwrap_or(DEFAULT_LOCALE)
}

/// 按指定语言翻译（不读取、不修改全局语言）
///
/// 扫码站可能各自配置语言，避免互相覆盖全局 locale
pub fn t_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let locale = normalize_locale(locale);
    fill_args(rust_i18n::t!(key, locale = locale).to_string(), args)
}

fn fill_args(mut text: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        text = text.replace(&placeholder, v);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("ms"), "ms");
        assert_eq!(normalize_locale("MS-my"), "ms");
        assert_eq!(normalize_locale("en-GB"), "en");
        assert_eq!(normalize_locale("zh-CN"), "en");
    }

    #[test]
    fn test_translate_in_explicit_locale() {
        let msg = t_in("en", "scan.not_found", &[("code", "abc-123")]);
        assert!(msg.contains("abc-123"));
        assert!(msg.contains("Invalid QR code"));

        let msg = t_in("ms", "scan.not_found", &[("code", "abc-123")]);
        assert!(msg.contains("abc-123"));
        assert!(msg.contains("Kod QR tidak sah"));
    }
}
