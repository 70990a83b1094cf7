use http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionStage {
    Writing,
    Failed,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) stage: SessionStage,
    pub(crate) parts: usize,
    pub(crate) bytes_written: u64,
    pub(crate) rejected: Option<StatusCode>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        SessionState {
            stage: SessionStage::Writing,
            parts: 0,
            bytes_written: 0,
            rejected: None,
        }
    }

    pub(crate) fn ensure_writable(&self) -> crate::Result<()> {
        match self.stage {
            SessionStage::Writing => Ok(()),
            SessionStage::Failed => match self.rejected {
                Some(status) => Err(crate::Error::UnexpectedStatus { status }),
                None => Err(crate::Error::SessionFailed),
            },
        }
    }

    pub(crate) fn fail<T>(&mut self, err: crate::Error) -> crate::Result<T> {
        log::warn!("upload session failed: {}", err);
        self.stage = SessionStage::Failed;
        if let Some(status) = err.status() {
            self.rejected = Some(status);
        }
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_session_rejects_writes() {
        let mut state = SessionState::new();
        assert_eq!(state.ensure_writable(), Ok(()));

        let res: crate::Result<()> = state.fail(crate::Error::BodyWriteFailed("connection closed".into()));
        assert!(res.is_err());
        assert_eq!(state.stage, SessionStage::Failed);
        assert_eq!(state.ensure_writable(), Err(crate::Error::SessionFailed));
    }

    #[test]
    fn test_rejected_session_keeps_status() {
        let mut state = SessionState::new();

        let res: crate::Result<()> = state.fail(crate::Error::UnexpectedStatus {
            status: StatusCode::UNAUTHORIZED,
        });
        assert!(res.is_err());
        assert_eq!(state.rejected, Some(StatusCode::UNAUTHORIZED));

        let err = state.ensure_writable().unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }
}
