//! Windows open file enumeration using the system handle table

use std::ffi::c_void;
use std::mem::size_of;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use windows::Wdk::System::SystemInformation::{
    NtQuerySystemInformation, SYSTEM_INFORMATION_CLASS,
};
use windows::Win32::Foundation::{CloseHandle, DUPLICATE_SAME_ACCESS, DuplicateHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
    FILE_NAME_NORMALIZED, FILE_TYPE_DISK, GetFileType, GetFinalPathNameByHandleW,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcess, PROCESS_DUP_HANDLE};

const SYSTEM_EXTENDED_HANDLE_INFORMATION: SYSTEM_INFORMATION_CLASS = SYSTEM_INFORMATION_CLASS(64);
const INITIAL_BUFFER_BYTES: usize = 1 << 20;
const MAX_BUFFER_BYTES: usize = 256 << 20;
const MAX_PATH_CHARS: usize = 1024;

#[repr(C)]
#[allow(dead_code)]
struct HandleTableHeader {
    number_of_handles: usize,
    reserved: usize,
}

#[repr(C)]
#[allow(dead_code)]
struct HandleEntry {
    object: *mut c_void,
    unique_process_id: usize,
    handle_value: usize,
    granted_access: u32,
    creator_back_trace_index: u16,
    object_type_index: u16,
    handle_attributes: u32,
    reserved: u32,
}

/// Paths of the disk files `pid` currently holds open, in handle order.
pub fn open_files(pid: u32) -> Result<Vec<PathBuf>> {
    let table = query_handle_table()?;

    let source = unsafe { OpenProcess(PROCESS_DUP_HANDLE, false, pid) }
        .with_context(|| format!("failed to open PID {} for handle duplication", pid))?;

    let mut files = Vec::new();
    for entry in handle_entries(&table) {
        if entry.unique_process_id != pid as usize {
            continue;
        }
        // SAFETY: source is a live process handle with PROCESS_DUP_HANDLE access
        if let Some(path) = unsafe { resolve_handle(source, entry.handle_value) } {
            files.push(path);
        }
    }

    unsafe {
        let _ = CloseHandle(source);
    }
    Ok(files)
}

fn query_handle_table() -> Result<Vec<u64>> {
    let mut bytes = INITIAL_BUFFER_BYTES;
    loop {
        // u64 storage keeps the entries pointer-aligned
        let mut buf = vec![0u64; bytes / size_of::<u64>()];
        let mut needed = 0u32;
        let status = unsafe {
            NtQuerySystemInformation(
                SYSTEM_EXTENDED_HANDLE_INFORMATION,
                buf.as_mut_ptr().cast(),
                (buf.len() * size_of::<u64>()) as u32,
                &mut needed,
            )
        };
        if status.is_ok() {
            return Ok(buf);
        }
        if bytes >= MAX_BUFFER_BYTES {
            return Err(anyhow!("system handle query failed: {:?}", status));
        }
        // The table grows between calls; leave headroom
        bytes = (needed as usize + (64 << 10)).max(bytes * 2);
    }
}

fn handle_entries(buf: &[u64]) -> &[HandleEntry] {
    let total = buf.len() * size_of::<u64>();
    let header_size = size_of::<HandleTableHeader>();
    if total < header_size {
        return &[];
    }
    // SAFETY: buf was filled by NtQuerySystemInformation with a header followed by entries
    unsafe {
        let header = &*(buf.as_ptr() as *const HandleTableHeader);
        let capacity = (total - header_size) / size_of::<HandleEntry>();
        let count = header.number_of_handles.min(capacity);
        let first = buf.as_ptr().cast::<u8>().add(header_size).cast::<HandleEntry>();
        std::slice::from_raw_parts(first, count)
    }
}

unsafe fn resolve_handle(source: HANDLE, value: usize) -> Option<PathBuf> {
    let mut local = HANDLE::default();
    unsafe {
        DuplicateHandle(
            source,
            HANDLE(value as *mut c_void),
            GetCurrentProcess(),
            &mut local,
            0,
            false,
            DUPLICATE_SAME_ACCESS,
        )
    }
    .ok()?;

    // Pipes can block GetFinalPathNameByHandleW; only disk files are of interest
    let path = if unsafe { GetFileType(local) } == FILE_TYPE_DISK {
        unsafe { final_path(local) }
    } else {
        None
    };

    unsafe {
        let _ = CloseHandle(local);
    }
    path
}

unsafe fn final_path(handle: HANDLE) -> Option<PathBuf> {
    let mut buf = [0u16; MAX_PATH_CHARS];
    let len = unsafe { GetFinalPathNameByHandleW(handle, &mut buf, FILE_NAME_NORMALIZED) } as usize;
    if len == 0 || len >= buf.len() {
        return None;
    }
    let raw = String::from_utf16_lossy(&buf[..len]);
    Some(PathBuf::from(strip_verbatim_prefix(&raw)))
}

/// `\\?\C:\runs\job.res` -> `C:\runs\job.res`; UNC paths become `\\server\share`.
fn strip_verbatim_prefix(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix(r"\\?\UNC\") {
        format!(r"\\{}", rest)
    } else if let Some(rest) = raw.strip_prefix(r"\\?\") {
        rest.to_string()
    } else {
        raw.to_string()
    }
}
