//! Standard security handler, revision 2 (40-bit RC4).
//!
//! Once protection is set, every string and stream written to the file is
//! encrypted with a key derived from the document key and the number of the
//! object that contains it.

use std::ops::BitOr;

use crate::codec::arcfour::Arcfour;

/// Padding appended to passwords shorter than 32 bytes.
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Actions granted to a user who opens the document with the user password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const PRINT: Permissions = Permissions(4);
    pub const MODIFY: Permissions = Permissions(8);
    pub const COPY: Permissions = Permissions(16);
    pub const ANNOT_FORMS: Permissions = Permissions(32);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self {
        Permissions(self.0 | rhs.0)
    }
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PASSWORD_PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

/// Encryption state of a document.
#[derive(Debug, Clone)]
pub struct Protection {
    o_value: [u8; 32],
    u_value: [u8; 32],
    p_value: i32,
    key: [u8; 5],
    /// Object number of the `/Encrypt` dictionary once written.
    pub(crate) object: usize,
    /// Key schedule for the most recently used object number.
    cipher: Option<(u32, Arcfour)>,
}

impl Protection {
    /// Derive the security values. An empty owner password is replaced by
    /// random bytes, so only the user password opens the document with full
    /// rights withheld.
    pub fn new(permissions: Permissions, user_password: &str, owner_password: &str) -> Self {
        let granted =
            Permissions::PRINT | Permissions::MODIFY | Permissions::COPY | Permissions::ANNOT_FORMS;
        let flags = 192 | (permissions.bits() & granted.bits());
        let owner: Vec<u8> = if owner_password.is_empty() {
            rand::random::<u64>().to_le_bytes().to_vec()
        } else {
            owner_password.as_bytes().to_vec()
        };
        let user = pad_password(user_password.as_bytes());
        let owner = pad_password(&owner);

        let owner_digest = md5::compute(owner).0;
        let mut o_value = user;
        Arcfour::new(&owner_digest[..5]).apply_keystream(&mut o_value);

        let mut context = md5::Context::new();
        context.consume(user);
        context.consume(o_value);
        context.consume([flags, 0xff, 0xff, 0xff]);
        let digest = context.finalize().0;
        let mut key = [0u8; 5];
        key.copy_from_slice(&digest[..5]);

        let mut u_value = PASSWORD_PADDING;
        Arcfour::new(&key).apply_keystream(&mut u_value);

        Self {
            o_value,
            u_value,
            p_value: -(i32::from(flags ^ 0xff) + 1),
            key,
            object: 0,
            cipher: None,
        }
    }

    /// Owner authentication value (`/O`).
    pub fn o_value(&self) -> &[u8; 32] {
        &self.o_value
    }

    /// User authentication value (`/U`).
    pub fn u_value(&self) -> &[u8; 32] {
        &self.u_value
    }

    /// Signed permission value (`/P`).
    pub fn p_value(&self) -> i32 {
        self.p_value
    }

    /// The 40-bit document key.
    pub fn key(&self) -> &[u8; 5] {
        &self.key
    }

    /// Per-object key: MD5 of the document key, the low three bytes of the
    /// object number and a zero generation number, truncated to 10 bytes.
    pub fn object_key(&self, n: u32) -> [u8; 10] {
        let nb = n.to_le_bytes();
        let mut context = md5::Context::new();
        context.consume(self.key);
        context.consume([nb[0], nb[1], nb[2], 0, 0]);
        let digest = context.finalize().0;
        let mut out = [0u8; 10];
        out.copy_from_slice(&digest[..10]);
        out
    }

    /// Encrypt `buf` in place as a string or stream of object `n`.
    ///
    /// The key schedule is derived once per object number; each buffer
    /// starts from a fresh copy of it.
    pub fn encrypt(&mut self, n: u32, buf: &mut [u8]) {
        let cached = matches!(&self.cipher, Some((m, _)) if *m == n);
        if !cached {
            self.cipher = Some((n, Arcfour::new(&self.object_key(n))));
        }
        if let Some((_, cipher)) = &self.cipher {
            cipher.clone().apply_keystream(buf);
        }
    }
}
