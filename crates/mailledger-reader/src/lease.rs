//! Folder open/close discipline.
//!
//! A call opens the folder only if it is closed, and only closes what it (or
//! an earlier call of the same continuation chain) opened. A folder the
//! caller had open before handing it over is never closed.

use crate::config::FolderAccess;
use crate::error::Result;
use crate::session::MailFolder;

/// Whether the current call is responsible for closing the folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FolderLease {
    owned: bool,
}

impl FolderLease {
    /// Opens the folder if needed.
    ///
    /// `retained` reports whether the reader kept this folder open at the end
    /// of its previous call; such a folder is still owned by the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be opened.
    pub async fn acquire<F>(folder: &mut F, access: FolderAccess, retained: bool) -> Result<Self>
    where
        F: MailFolder + ?Sized,
    {
        if folder.is_open() {
            return Ok(Self { owned: retained });
        }
        folder.open(access).await?;
        tracing::debug!(folder = folder.name(), ?access, "Opened folder");
        Ok(Self { owned: true })
    }

    /// Returns true if this lease opened the folder.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owned
    }

    /// Ends a successful call. Returns true if the folder stays open for the
    /// next call of a continuation chain.
    ///
    /// A failure to close is logged; the call already succeeded.
    pub async fn release<F>(self, folder: &mut F, continuation_pending: bool) -> bool
    where
        F: MailFolder + ?Sized,
    {
        if !self.owned {
            return false;
        }
        if continuation_pending {
            tracing::trace!(folder = folder.name(), "Keeping folder open for next call");
            return true;
        }
        close_quietly(folder).await;
        false
    }

    /// Ends a failed or cancelled call, closing the folder if owned.
    pub async fn abandon<F>(self, folder: &mut F)
    where
        F: MailFolder + ?Sized,
    {
        if self.owned && folder.is_open() {
            close_quietly(folder).await;
        }
    }
}

pub(crate) async fn close_quietly<F>(folder: &mut F)
where
    F: MailFolder + ?Sized,
{
    match folder.close(false).await {
        Ok(()) => tracing::debug!(folder = folder.name(), "Closed folder"),
        Err(e) => tracing::warn!(?e, folder = folder.name(), "Failed to close folder"),
    }
}
