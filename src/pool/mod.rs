use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::debug;
use memmap2::MmapMut;

use crate::core::{CtlError, PoolKind, Result};
use crate::ctl::CtlRegistry;
use crate::policy::PolicyStore;
use crate::probe::page_size;
#[cfg(unix)]
use crate::probe::{MincoreQuery, count_resident_pages};

/// First page of every pool file: magic plus the recorded pool size.
pub const POOL_HDR_SIZE: usize = 4096;

const HDR_MAGIC_LEN: usize = 8;
const HDR_SIZE_OFF: usize = 8;

const MIN_POOL_OBJ: usize = 8 * 1024 * 1024;
const MIN_POOL_BLK: usize = 16 * 1024 * 1024;
const MIN_POOL_LOG: usize = 2 * 1024 * 1024;

fn magic(kind: PoolKind) -> &'static [u8; HDR_MAGIC_LEN] {
    match kind {
        PoolKind::Obj => b"PMEMOBJ\0",
        PoolKind::Blk => b"PMEMBLK\0",
        PoolKind::Log => b"PMEMLOG\0",
    }
}

/// An open memory-mapped pool.
///
/// Owns the mapping and its own [`PolicyStore`], snapshotted from the
/// kind's global defaults at the moment of [`Pool::create`] or
/// [`Pool::open`]. Closing (or dropping) the handle unmaps the pool
/// and discards the store.
#[derive(Debug)]
pub struct Pool {
    kind: PoolKind,
    path: PathBuf,
    map: MmapMut,
    size: usize,
    policy: PolicyStore,
}

impl Pool {
    fn map_new(file: &File, size: usize) -> Result<MmapMut> {
        file.set_len(size as u64)?;
        Ok(unsafe { MmapMut::map_mut(file)? })
    }

    /// Smallest accepted pool size for a kind, header included.
    pub fn min_size(kind: PoolKind) -> usize {
        match kind {
            PoolKind::Obj => MIN_POOL_OBJ,
            PoolKind::Blk => MIN_POOL_BLK,
            PoolKind::Log => MIN_POOL_LOG,
        }
    }

    /// Create a new pool file of `size` bytes and map it.
    ///
    /// The kind's `prefault.at_create` flag is read once, at this call;
    /// if enabled, every page of the mapping is resident on return.
    pub fn create<P: AsRef<Path>>(
        kind: PoolKind,
        path: P,
        size: usize,
        mode: u32,
    ) -> Result<Self> {
        let path = path.as_ref();
        if size < Self::min_size(kind) {
            return Err(CtlError::PoolUnavailable(format!(
                "size {} below minimum {} for {} pool",
                size,
                Self::min_size(kind),
                kind
            )));
        }

        let mut opts = OpenOptions::new();
        opts.read(true).write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let file = opts.open(path)?;
        let mut map = match Self::map_new(&file, size) {
            Ok(map) => map,
            Err(err) => {
                // a failed create must not leave the file behind
                let _ = std::fs::remove_file(path);
                return Err(err);
            }
        };

        let policy = CtlRegistry::for_kind(kind).snapshot_defaults()?;

        map[..HDR_MAGIC_LEN].copy_from_slice(magic(kind));
        map[HDR_SIZE_OFF..HDR_SIZE_OFF + 8]
            .copy_from_slice(&(size as u64).to_le_bytes());

        if policy.at_create {
            prefault(&mut map);
        }

        debug!(
            "created {} pool {} ({} bytes, at_create={})",
            kind,
            path.display(),
            size,
            policy.at_create
        );

        Ok(Self {
            kind,
            path: path.to_path_buf(),
            map,
            size,
            policy,
        })
    }

    /// Open an existing pool file and map it.
    ///
    /// The kind's `prefault.at_open` flag is read once, at this call;
    /// if enabled, every page of the mapping is resident on return.
    pub fn open<P: AsRef<Path>>(kind: PoolKind, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len() as usize;
        if len < POOL_HDR_SIZE {
            return Err(CtlError::PoolUnavailable(format!(
                "{}: file too small for a pool header",
                path.display()
            )));
        }

        let mut map = unsafe { MmapMut::map_mut(&file)? };

        if &map[..HDR_MAGIC_LEN] != magic(kind) {
            return Err(CtlError::PoolUnavailable(format!(
                "{}: not a {} pool",
                path.display(),
                kind
            )));
        }
        let recorded =
            u64::from_le_bytes(map[HDR_SIZE_OFF..HDR_SIZE_OFF + 8].try_into().unwrap())
                as usize;
        if recorded != len {
            return Err(CtlError::PoolUnavailable(format!(
                "{}: recorded size {} does not match file size {}",
                path.display(),
                recorded,
                len
            )));
        }

        let policy = CtlRegistry::for_kind(kind).snapshot_defaults()?;

        if policy.at_open {
            prefault(&mut map);
        }

        debug!(
            "opened {} pool {} ({} bytes, at_open={})",
            kind,
            path.display(),
            len,
            policy.at_open
        );

        Ok(Self {
            kind,
            path: path.to_path_buf(),
            map,
            size: len,
            policy,
        })
    }

    /// Unmap the pool. Dropping the handle does the same.
    pub fn close(self) {
        debug!("closed {} pool {}", self.kind, self.path.display());
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Nominal pool size in bytes (file size, header included).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Start of the mapped region.
    pub fn base(&self) -> *const u8 {
        self.map.as_ptr()
    }

    pub fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    pub(crate) fn policy_mut(&mut self) -> &mut PolicyStore {
        &mut self.policy
    }

    /// Query this leaf against the pool's own policy store.
    pub fn ctl_get(&self, path: &str) -> Result<i32> {
        crate::ctl::ctl_get(crate::ctl::Scope::Pool(self), path)
    }

    /// Mutate this leaf in the pool's own policy store.
    pub fn ctl_set(&mut self, path: &str, value: i32) -> Result<()> {
        crate::ctl::ctl_set(crate::ctl::ScopeMut::Pool(self), path, value)
    }

    /// Resident-page count over the whole mapping, via `mincore(2)`.
    #[cfg(unix)]
    pub fn resident_pages(&self) -> Result<usize> {
        count_resident_pages(&MincoreQuery, self.base(), self.size)
    }
}

/// Touch every page of the mapping so it is backed by a physical frame.
///
/// A volatile read-modify-write per page: the write fault is what
/// forces the kernel to materialize the page for a shared file mapping.
fn prefault(map: &mut MmapMut) {
    let page = page_size();
    let ptr = map.as_mut_ptr();
    let len = map.len();

    let mut off = 0;
    while off < len {
        unsafe {
            let p = ptr.add(off);
            std::ptr::write_volatile(p, std::ptr::read_volatile(p));
        }
        off += page;
    }
}
