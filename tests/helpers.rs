//! Shared test utilities for storepack tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use tar::{Builder, EntryType, Header};
use xz2::write::XzEncoder;

/// One member of a test archive.
pub enum Member {
    File { path: &'static str, mode: u32, uid: u64, gid: u64 },
    Symlink { path: &'static str, target: &'static str, uid: u64, gid: u64 },
    Dir { path: &'static str, mode: u32, uid: u64, gid: u64 },
}

/// Write an xz-compressed tarball containing `members` in order.
pub fn write_tarball(path: &Path, members: &[Member]) -> PathBuf {
    let file = File::create(path).expect("create tarball");
    let encoder = XzEncoder::new(file, 6);
    let mut builder = Builder::new(encoder);

    for member in members {
        match member {
            Member::File { path, mode, uid, gid } => {
                let data = b"payload";
                let mut header = Header::new_gnu();
                header.set_path(path).unwrap();
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_uid(*uid);
                header.set_gid(*gid);
                header.set_size(data.len() as u64);
                header.set_cksum();
                builder.append(&header, &data[..]).unwrap();
            }
            Member::Symlink { path, target, uid, gid } => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Symlink);
                header.set_mode(0o777);
                header.set_uid(*uid);
                header.set_gid(*gid);
                header.set_size(0);
                builder.append_link(&mut header, path, target).unwrap();
            }
            Member::Dir { path, mode, uid, gid } => {
                let mut header = Header::new_gnu();
                header.set_path(path).unwrap();
                header.set_entry_type(EntryType::Directory);
                header.set_mode(*mode);
                header.set_uid(*uid);
                header.set_gid(*gid);
                header.set_size(0);
                header.set_cksum();
                builder.append(&header, std::io::empty()).unwrap();
            }
        }
    }

    let encoder = builder.into_inner().expect("finish tar");
    encoder.finish().expect("finish xz");
    path.to_path_buf()
}

/// A small store-shaped archive: a directory, two files, a symlink.
pub fn default_members() -> Vec<Member> {
    vec![
        Member::Dir { path: "overlay/", mode: 0o755, uid: 0, gid: 0 },
        Member::File { path: "overlay/layer", mode: 0o644, uid: 0, gid: 0 },
        Member::File { path: "overlay/secret", mode: 0, uid: 107, gid: 107 },
        Member::Symlink { path: "overlay/link", target: "layer", uid: 5, gid: 10 },
    ]
}
