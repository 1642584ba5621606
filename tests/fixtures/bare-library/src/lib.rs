//! A valid shared library that exports no `PLUGCALC_PLUGIN`.

#[unsafe(no_mangle)]
pub extern "C" fn bare_library_answer() -> u32 {
    42
}
