//! Internal error handling macros.

/// Displays a diagnostic message and aborts the program.
///
/// Use this for unrecoverable failures of the storage engine itself: an
/// exhausted flat index space or a broken layout invariant. The program
/// prints the diagnostic and immediately aborts without unwinding, so no
/// thread can observe the storage in a corrupted state.
///
/// # Examples
///
/// ```ignore
/// if flat >= Self::MAX_SLOTS {
///   fatal!("flat index space exhausted");
/// }
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: unrecoverable storage failure: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

pub(crate) use fatal;
