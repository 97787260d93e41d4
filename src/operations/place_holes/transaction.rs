use tracing::{debug, warn};

use crate::error::SinkError;
use crate::host::{ModelHandle, TransactionHost};

/// Write access to one model, held for the lifetime of the scope.
///
/// The transaction is committed only by [`commit`](Self::commit). Every
/// other exit path, including an early `?` return or a panic unwinding
/// through the scope, rolls it back on drop.
pub struct TransactionScope<'h, H: TransactionHost + ?Sized> {
    host: &'h mut H,
    model: &'h ModelHandle,
    open: bool,
}

impl<'h, H: TransactionHost + ?Sized> TransactionScope<'h, H> {
    /// Opens a transaction named `label` on `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to open the transaction.
    pub fn begin(host: &'h mut H, model: &'h ModelHandle, label: &str) -> Result<Self, SinkError> {
        host.begin(model, label)?;
        debug!(model = model.title(), label, "transaction opened");
        Ok(Self {
            host,
            model,
            open: true,
        })
    }

    /// The host, for mutations inside the transaction.
    pub fn host_mut(&mut self) -> &mut H {
        self.host
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses the commit; the transaction is
    /// then rolled back when the scope drops.
    pub fn commit(mut self) -> Result<(), SinkError> {
        self.host.commit(self.model)?;
        self.open = false;
        debug!(model = self.model.title(), "transaction committed");
        Ok(())
    }
}

impl<H: TransactionHost + ?Sized> Drop for TransactionScope<'_, H> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        match self.host.rollback(self.model) {
            Ok(()) => warn!(model = self.model.title(), "transaction rolled back"),
            Err(error) => warn!(model = self.model.title(), %error, "rollback failed"),
        }
    }
}
