//! A thin wrapper over the raw `AF_NETLINK`/`NETLINK_SOCK_DIAG` datagram
//! socket used to talk to the kernel's `sock_diag` subsystem.
//!
//! `sock_diag` requires a **datagram** netlink socket (`SOCK_DGRAM`); this
//! diverges from a generic netlink socket wrapper's usual `SOCK_RAW`
//! default (see DESIGN.md).

use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};

use crate::error::SetupError;

/// An open, bound `sock_diag` netlink socket.
pub struct NetlinkSocket {
    fd: RawFd,
}

impl NetlinkSocket {
    /// Open a datagram netlink socket bound to `NETLINK_SOCK_DIAG`, bind it
    /// to an anonymous local address, and apply `recv_timeout_millis` as
    /// `SO_RCVTIMEO` (`0` disables the timeout).
    pub fn open(recv_timeout_millis: u64) -> Result<Self, SetupError> {
        let fd = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_DGRAM | libc::SOCK_CLOEXEC,
                libc::NETLINK_SOCK_DIAG,
            )
        };
        if fd < 0 {
            return Err(SetupError::Socket(io::Error::last_os_error()));
        }
        let socket = NetlinkSocket { fd };

        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as u16;
        let ret = unsafe {
            libc::bind(
                fd,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as u32,
            )
        };
        if ret < 0 {
            return Err(SetupError::Bind(io::Error::last_os_error()));
        }

        if recv_timeout_millis > 0 {
            socket.set_recv_timeout(recv_timeout_millis)?;
        }

        Ok(socket)
    }

    fn set_recv_timeout(&self, millis: u64) -> Result<(), SetupError> {
        let tv = libc::timeval {
            tv_sec: (millis / 1000) as libc::time_t,
            tv_usec: ((millis % 1000) * 1000) as libc::suseconds_t,
        };
        let ret = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &tv as *const libc::timeval as *const libc::c_void,
                mem::size_of::<libc::timeval>() as u32,
            )
        };
        if ret < 0 {
            Err(SetupError::SetSockOpt(io::Error::last_os_error()))
        } else {
            Ok(())
        }
    }

    /// Send a dump request to the kernel (destination pid 0).
    pub fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as u16;
        let ret = unsafe {
            libc::sendto(
                self.fd,
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
                0,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as u32,
            )
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret as usize)
        }
    }

    /// Receive one datagram into `buf`, blocking up to the configured
    /// receive timeout. Returns `Err(ErrorKind::WouldBlock)` on timeout.
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let ret = unsafe {
            libc::recvfrom(
                self.fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret as usize)
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for NetlinkSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

// Safety: the fd is exclusively owned by this struct and every operation
// goes through libc syscalls that are safe to call concurrently on the
// same fd from multiple threads (the kernel serializes them); this is
// exactly the pattern §5 relies on ("the kernel permits concurrent
// receivers on one datagram socket").
unsafe impl Send for NetlinkSocket {}
unsafe impl Sync for NetlinkSocket {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn open_bind_and_timeout_recv_returns_would_block() {
        let socket = match NetlinkSocket::open(50) {
            Ok(s) => s,
            Err(_) => return, // environment without netlink access (e.g. sandboxed CI)
        };
        let mut buf = vec![0u8; 4096];
        let err = socket.recv(&mut buf).expect_err("no data should arrive");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }
}
