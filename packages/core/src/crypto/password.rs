//! Password sources for encrypted private keys
//!
//! Loaders take an optional `&dyn PasswordSource` and call `resolve()` at most
//! once, and only when the input turns out to be encrypted. This lets a caller
//! defer prompting until a password is actually needed.

use once_cell::unsync::OnceCell;
use std::cell::Cell;
use zeroize::Zeroizing;

pub trait PasswordSource {
    fn resolve(&self) -> Zeroizing<Vec<u8>>;
}

impl PasswordSource for &[u8] {
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.to_vec())
    }
}

impl<const N: usize> PasswordSource for [u8; N] {
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.to_vec())
    }
}

impl PasswordSource for Vec<u8> {
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.clone())
    }
}

impl PasswordSource for &str {
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.as_bytes().to_vec())
    }
}

impl PasswordSource for String {
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.as_bytes().to_vec())
    }
}

/// Lazily evaluated password, e.g. an interactive prompt.
///
/// The callback runs on the first `resolve()` and never again; later calls
/// hand back the same (zeroized on drop) bytes.
///
/// ```
/// use construct_pk::PasswordCallback;
///
/// let prompt = PasswordCallback::new(|| b"hunter2".to_vec());
/// # let _ = prompt;
/// ```
pub struct PasswordCallback<F> {
    callback: Cell<Option<F>>,
    resolved: OnceCell<Zeroizing<Vec<u8>>>,
}

impl<F> PasswordCallback<F>
where
    F: FnOnce() -> Vec<u8>,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback: Cell::new(Some(callback)),
            resolved: OnceCell::new(),
        }
    }
}

impl<F> PasswordSource for PasswordCallback<F>
where
    F: FnOnce() -> Vec<u8>,
{
    fn resolve(&self) -> Zeroizing<Vec<u8>> {
        self.resolved
            .get_or_init(|| match self.callback.take() {
                Some(callback) => Zeroizing::new(callback()),
                None => Zeroizing::new(Vec::new()),
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sources() {
        assert_eq!(&*b"secret".resolve(), b"secret");
        assert_eq!(&*(&b"secret"[..]).resolve(), b"secret");
        assert_eq!(&*"secret".resolve(), b"secret");
        assert_eq!(&*String::from("secret").resolve(), b"secret");

        let source: &dyn PasswordSource = &"secret";
        assert_eq!(&*source.resolve(), b"secret");
    }

    #[test]
    fn test_callback_runs_once() {
        let calls = Cell::new(0);
        let source = PasswordCallback::new(|| {
            calls.set(calls.get() + 1);
            b"pw".to_vec()
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(&*source.resolve(), b"pw");
        assert_eq!(&*source.resolve(), b"pw");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_callback_may_move_its_capture() {
        let secret = String::from("moved");
        let source = PasswordCallback::new(move || secret.into_bytes());
        assert_eq!(&*source.resolve(), b"moved");
        assert_eq!(&*source.resolve(), b"moved");
    }
}
