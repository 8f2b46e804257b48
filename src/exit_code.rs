use num_enum::IntoPrimitive;
use strum::Display;

/// A process exit code, as in sysexits.h.
///
/// The sysexits conventions are only loosely followed in the wild, but they
/// give unhandled errors a more useful exit status than a blanket 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// The command was used incorrectly - bad arguments, a bad flag, etc.
    Usage = 64,
    /// The input data was incorrect in some way. Only used for the user's
    /// data, never for system files.
    DataError = 65,
    /// An input file did not exist or was not readable.
    NoInput = 66,
    /// The user specified did not exist.
    NoUser = 67,
    /// The host specified did not exist.
    NoHost = 68,
    /// A service is unavailable, or a catchall for "didn't work, don't know
    /// why".
    Unavailable = 69,
    /// An internal software error has been detected. The default exit code
    /// for any error that does not otherwise specify one.
    Software = 70,
    /// An operating system error - "cannot fork", "cannot pipe", and the
    /// like.
    OsError = 71,
    /// A system file does not exist or cannot be opened.
    OsFile = 72,
    /// A user-specified output file cannot be created.
    CantCreate = 73,
    /// An error occurred while doing I/O on some file.
    IoError = 74,
    /// Temporary failure; the request should be reattempted later.
    TempFail = 75,
    /// The remote system returned something "not possible" during a protocol
    /// exchange.
    Protocol = 76,
    /// Insufficient permission, for something other than a file system
    /// problem (which should use NoInput or CantCreate instead).
    NoPermission = 77,
    /// Something was found in an unconfigured or misconfigured state.
    Config = 78,
}

/// An OS error code, in the spirit of errno.h. Non-exhaustive; grown as
/// codes show up in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorCode {
    #[strum(serialize = "EACCES")]
    Access,
    #[strum(serialize = "EADDRINUSE")]
    AddressInUse,
    #[strum(serialize = "ECONNREFUSED")]
    ConnectionRefused,
    #[strum(serialize = "ECONNRESET")]
    ConnectionReset,
    #[strum(serialize = "EEXIST")]
    Exists,
    #[strum(serialize = "EISDIR")]
    IsDirectory,
    #[strum(serialize = "EMFILE")]
    MaxFileDescriptors,
    #[strum(serialize = "ENOENT")]
    NoEntity,
    #[strum(serialize = "ENOTDIR")]
    NotADirectory,
    #[strum(serialize = "ENOTEMPTY")]
    NotEmpty,
    #[strum(serialize = "ENOTFOUND")]
    DnsNotFound,
    #[strum(serialize = "EPERM")]
    NotPermitted,
    #[strum(serialize = "EPIPE")]
    BrokenPipe,
    #[strum(serialize = "ETIMEDOUT")]
    TimedOut,
    #[strum(serialize = "EUNKNOWN")]
    Unknown,
}

impl ErrorCode {
    pub fn from_io_error(error: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::NotFound => ErrorCode::NoEntity,
            ErrorKind::PermissionDenied => ErrorCode::Access,
            ErrorKind::AlreadyExists => ErrorCode::Exists,
            ErrorKind::ConnectionRefused => ErrorCode::ConnectionRefused,
            ErrorKind::ConnectionReset => ErrorCode::ConnectionReset,
            ErrorKind::BrokenPipe => ErrorCode::BrokenPipe,
            ErrorKind::TimedOut => ErrorCode::TimedOut,
            _ => ErrorCode::Unknown,
        }
    }
}

/// The general mapping from OS error codes to exit codes. EACCES maps to
/// NoInput here (the read case); write sites override it to CantCreate.
impl From<ErrorCode> for ExitCode {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Access => ExitCode::NoInput,
            ErrorCode::AddressInUse => ExitCode::Unavailable,
            ErrorCode::ConnectionRefused => ExitCode::Unavailable,
            ErrorCode::ConnectionReset => ExitCode::Unavailable,
            ErrorCode::Exists => ExitCode::CantCreate,
            ErrorCode::IsDirectory => ExitCode::NoInput,
            ErrorCode::MaxFileDescriptors => ExitCode::OsError,
            ErrorCode::NoEntity => ExitCode::NoInput,
            ErrorCode::NotADirectory => ExitCode::NoInput,
            ErrorCode::NotEmpty => ExitCode::CantCreate,
            ErrorCode::DnsNotFound => ExitCode::NoHost,
            ErrorCode::NotPermitted => ExitCode::NoPermission,
            ErrorCode::BrokenPipe => ExitCode::IoError,
            ErrorCode::TimedOut => ExitCode::Unavailable,
            ErrorCode::Unknown => ExitCode::OsError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exit_codes_follow_sysexits() {
        assert_eq!(i32::from(ExitCode::Usage), 64);
        assert_eq!(i32::from(ExitCode::Software), 70);
        assert_eq!(i32::from(ExitCode::Config), 78);
    }

    #[test]
    fn errno_maps_to_exit_code() {
        assert_eq!(ExitCode::from(ErrorCode::NoEntity), ExitCode::NoInput);
        assert_eq!(ExitCode::from(ErrorCode::Exists), ExitCode::CantCreate);
        assert_eq!(
            ExitCode::from(ErrorCode::NotPermitted),
            ExitCode::NoPermission
        );
        assert_eq!(ExitCode::from(ErrorCode::TimedOut), ExitCode::Unavailable);
    }

    #[test]
    fn errno_names_render_like_errno_h() {
        assert_eq!(ErrorCode::NoEntity.to_string(), "ENOENT");
        assert_eq!(ErrorCode::Access.to_string(), "EACCES");
    }
}
