use log::trace;

use crate::core::{CtlError, Result};

/// OS-boundary adapter for page-residency queries.
///
/// The single platform-specific surface of the crate. A query reports,
/// for each page overlapping `[addr, addr + len)`, whether that page is
/// currently backed by a physical frame. Queries are point-in-time and
/// must never fault pages in themselves.
pub trait ResidencyQuery {
    /// Granularity of the residency vector in bytes.
    fn page_size(&self) -> usize;

    /// One flag per page of the range, lowest address first.
    fn query_residency(&self, addr: *const u8, len: usize) -> Result<Vec<bool>>;
}

/// Pages needed to cover `len` bytes at `page_size` granularity.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size)
}

/// Count of resident pages over `[addr, addr + len)`.
///
/// Always within `[0, page_count(len, query.page_size())]`.
pub fn count_resident_pages<Q>(query: &Q, addr: *const u8, len: usize) -> Result<usize>
where
    Q: ResidencyQuery + ?Sized,
{
    let flags = query.query_residency(addr, len)?;
    let resident = flags.iter().filter(|&&r| r).count();
    trace!(
        "residency {:p}+{}: {}/{} pages",
        addr,
        len,
        resident,
        flags.len()
    );
    Ok(resident)
}

/// The platform's VM page size.
#[cfg(unix)]
pub fn page_size() -> usize {
    // sysconf(_SC_PAGESIZE) cannot fail on any supported platform
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(not(unix))]
pub fn page_size() -> usize {
    4096
}

/// `mincore(2)`-backed residency query.
///
/// The kernel fills one byte per page; bit 0 means resident. The call
/// inspects the page tables only, so probing never materializes pages.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct MincoreQuery;

#[cfg(unix)]
impl ResidencyQuery for MincoreQuery {
    fn page_size(&self) -> usize {
        page_size()
    }

    fn query_residency(&self, addr: *const u8, len: usize) -> Result<Vec<bool>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let pages = page_count(len, self.page_size());
        let mut vec = vec![0u8; pages];

        let ret = unsafe {
            libc::mincore(
                addr as *mut libc::c_void,
                len,
                vec.as_mut_ptr() as *mut _,
            )
        };
        if ret != 0 {
            let err = std::io::Error::last_os_error();
            return Err(CtlError::ProbeFailure(format!(
                "mincore({addr:p}, {len}): {err}"
            )));
        }

        Ok(vec.into_iter().map(|b| b & 0x1 != 0).collect())
    }
}
