//! Централизованная конфигурация для construct-pk
//!
//! Все константы и настройки библиотеки определены здесь,
//! чтобы избежать хардкода по всему проекту.

use crate::crypto::curve::Curve;
use crate::crypto::digest::DigestAlgorithm;
use std::sync::OnceLock;

/// Глобальная конфигурация (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // RSA
    // ============================================

    /// Smallest modulus size (bits) `Rsa::generate` accepts
    pub rsa_min_key_size: usize,

    /// Largest modulus size (bits) `Rsa::generate` accepts
    pub rsa_max_key_size: usize,

    /// Modulus size used by `Rsa::generate_default`
    pub rsa_default_key_size: usize,

    /// Public exponent used by `Rsa::generate_default`
    pub rsa_default_exponent: u64,

    // ============================================
    // ECC / ПОДПИСИ
    // ============================================

    /// Curve bound to `Ecc::new(None)`
    pub default_curve: Curve,

    /// Digest used when `sign`/`verify` get no explicit algorithm
    pub default_digest: DigestAlgorithm,

    // ============================================
    // ЗАШИФРОВАННЫЙ PKCS#8
    // ============================================

    /// PBKDF2: количество итераций при шифровании приватного ключа паролем
    pub pbkdf2_iterations: u32,

    /// Длина соли для PBKDF2 (в байтах)
    pub salt_length: usize,

    // ============================================
    // ЗАГРУЗКА
    // ============================================

    /// Maximum size of a key file accepted by `from_file` (bytes)
    pub max_key_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // RSA
            rsa_min_key_size: 1024,
            rsa_max_key_size: 8192,
            rsa_default_key_size: 2048,
            rsa_default_exponent: 65537,

            // ECC
            default_curve: Curve::Secp256r1,
            default_digest: DigestAlgorithm::Sha256,

            // PKCS#8
            pbkdf2_iterations: 100_000,
            salt_length: 16,

            // Загрузка
            max_key_file_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Переопределяем значения из env, если они заданы
        if let Ok(val) = std::env::var("RSA_MIN_KEY_SIZE") {
            if let Ok(parsed) = val.parse() {
                config.rsa_min_key_size = parsed;
            }
        }

        if let Ok(val) = std::env::var("PBKDF2_ITERATIONS") {
            if let Ok(parsed) = val.parse() {
                config.pbkdf2_iterations = parsed;
            }
        }

        if let Ok(val) = std::env::var("MAX_KEY_FILE_SIZE") {
            if let Ok(parsed) = val.parse() {
                config.max_key_file_size = parsed;
            }
        }

        config
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::default())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::from_env())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| "Config already initialized")
    }

    /// Проверить, инициализирована ли глобальная конфигурация
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rsa_min_key_size, 1024);
        assert_eq!(config.rsa_default_key_size, 2048);
        assert_eq!(config.rsa_default_exponent, 65537);
    }

    #[test]
    fn test_config_values() {
        let config = Config::default();

        // ECC
        assert_eq!(config.default_curve, Curve::Secp256r1);
        assert_eq!(config.default_digest, DigestAlgorithm::Sha256);

        // PKCS#8
        assert_eq!(config.pbkdf2_iterations, 100_000);
        assert_eq!(config.salt_length, 16);

        assert!(config.rsa_min_key_size < config.rsa_max_key_size);
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("RSA_MIN_KEY_SIZE", "2048");
        std::env::set_var("PBKDF2_ITERATIONS", "5000");
        // Неразборчивое значение игнорируется
        std::env::set_var("MAX_KEY_FILE_SIZE", "one megabyte");

        let config = Config::from_env();

        std::env::remove_var("RSA_MIN_KEY_SIZE");
        std::env::remove_var("PBKDF2_ITERATIONS");
        std::env::remove_var("MAX_KEY_FILE_SIZE");

        assert_eq!(config.rsa_min_key_size, 2048);
        assert_eq!(config.pbkdf2_iterations, 5000);
        assert_eq!(config.max_key_file_size, Config::default().max_key_file_size);
        assert_eq!(config.rsa_max_key_size, 8192);
    }
}
