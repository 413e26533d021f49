//! Archive extraction for downloaded release assets.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Archive formats the extractor understands, identified by content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarBz2,
    Tar,
}

impl ArchiveKind {
    /// Identify an archive from its leading bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(ArchiveKind::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Some(ArchiveKind::TarGz)
        } else if header.starts_with(b"BZh") {
            Some(ArchiveKind::TarBz2)
        } else if header.get(257..262) == Some(b"ustar".as_slice()) {
            Some(ArchiveKind::Tar)
        } else {
            None
        }
    }

    /// Identify the archive stored at `path`.
    pub fn detect(path: &Path) -> Result<Option<Self>> {
        let mut header = Vec::with_capacity(512);
        File::open(path)?.take(512).read_to_end(&mut header)?;
        Ok(Self::sniff(&header))
    }
}

/// Unpack `archive` into `dest`, returning the entries written, relative to `dest`.
///
/// Returns `Ok(None)` without touching anything when the file is not a
/// recognised archive.
pub async fn decompress(archive: &Path, dest: &Path) -> Result<Option<Vec<PathBuf>>> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || decompress_blocking(&archive, &dest)).await?
}

fn decompress_blocking(archive: &Path, dest: &Path) -> Result<Option<Vec<PathBuf>>> {
    let Some(kind) = ArchiveKind::detect(archive)? else {
        return Ok(None);
    };
    debug!(archive = %archive.display(), ?kind, "extracting");

    let entries = match kind {
        ArchiveKind::Zip => extract_zip(archive, dest)?,
        ArchiveKind::TarGz => extract_tar(GzDecoder::new(File::open(archive)?), dest)?,
        ArchiveKind::TarBz2 => extract_tar(BzDecoder::new(File::open(archive)?), dest)?,
        ArchiveKind::Tar => extract_tar(File::open(archive)?, dest)?,
    };
    Ok(Some(entries))
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = zip::ZipArchive::new(File::open(archive)?)?;
    let mut written = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            warn!(entry = file.name(), "skipping zip entry outside destination");
            continue;
        };
        let outpath = dest.join(&relative);

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&outpath)?;
            io::copy(&mut file, &mut out)?;

            // Preserve executable permission on Unix
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = file.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
        }
        written.push(relative);
    }
    Ok(written)
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = tar::Archive::new(reader);
    let mut written = Vec::new();

    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let path = entry.path().map_err(archive_err)?.into_owned();
        // unpack_in drops root, prefix and `.` components; report what it writes
        let relative: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        // unpack_in refuses entries that would land outside dest
        if entry.unpack_in(dest).map_err(archive_err)? {
            written.push(relative);
        } else {
            warn!(entry = %path.display(), "skipping tar entry outside destination");
        }
    }
    Ok(written)
}

fn archive_err(err: io::Error) -> Error {
    Error::Archive(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bzip2::write::BzEncoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
        let gz = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn sniffs_formats() {
        assert_eq!(ArchiveKind::sniff(b"PK\x03\x04rest"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::sniff(&[0x1f, 0x8b, 8, 0]), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::sniff(b"BZh91AY&SY"), Some(ArchiveKind::TarBz2));
        assert_eq!(ArchiveKind::sniff(b"#!/bin/sh\necho hi\n"), None);
        assert_eq!(ArchiveKind::sniff(b""), None);
    }

    #[tokio::test]
    async fn extracts_zip_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("release.zip");
        write_zip(&archive, &[("tool", "binary"), ("docs/README.md", "readme")]);

        let dest = tmp.path().join("out");
        let entries = decompress(&archive, &dest).await.unwrap().unwrap();

        assert_eq!(
            entries,
            vec![PathBuf::from("tool"), PathBuf::from("docs/README.md")]
        );
        assert_eq!(std::fs::read(dest.join("tool")).unwrap(), b"binary");
        assert_eq!(std::fs::read(dest.join("docs/README.md")).unwrap(), b"readme");
    }

    #[tokio::test]
    async fn extracts_tar_gz_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("release.tar.gz");
        write_tar_gz(&archive, &[("./tool", "binary"), ("LICENSE", "mit")]);

        let entries = decompress(&archive, tmp.path()).await.unwrap().unwrap();

        assert_eq!(entries, vec![PathBuf::from("tool"), PathBuf::from("LICENSE")]);
        assert_eq!(std::fs::read(tmp.path().join("tool")).unwrap(), b"binary");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(tmp.path().join("tool")).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[tokio::test]
    async fn extracts_tar_bz2_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("release.tar.bz2");
        let mut bz = BzEncoder::new(File::create(&archive).unwrap(), bzip2::Compression::default());
        bz.write_all(&tar_bytes(&[("bin/tool", "binary")])).unwrap();
        bz.finish().unwrap();

        let dest = tmp.path().join("out");
        let entries = decompress(&archive, &dest).await.unwrap().unwrap();

        assert_eq!(entries, vec![PathBuf::from("bin/tool")]);
        assert_eq!(std::fs::read(dest.join("bin/tool")).unwrap(), b"binary");
    }

    #[tokio::test]
    async fn absolute_tar_names_are_reported_inside_dest() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        // tar::Builder refuses absolute names, so write the raw GNU header.
        let data = b"binary";
        let mut header = tar::Header::new_gnu();
        let name = b"/x/tool";
        header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, &data[..]).unwrap();
        let archive = tmp.path().join("abs.tar");
        std::fs::write(&archive, builder.into_inner().unwrap()).unwrap();

        let entries = decompress(&archive, &dest).await.unwrap().unwrap();

        assert_eq!(entries, vec![PathBuf::from("x/tool")]);
        for entry in &entries {
            let full = dest.join(entry);
            assert!(full.starts_with(&dest));
            assert_eq!(std::fs::read(full).unwrap(), b"binary");
        }
    }

    #[tokio::test]
    async fn plain_files_are_not_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("tool");
        std::fs::write(&file, b"\x7fELF not an archive").unwrap();

        assert!(decompress(&file, tmp.path()).await.unwrap().is_none());
        assert!(file.exists());
    }

    #[tokio::test]
    async fn corrupt_zip_is_an_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("broken.zip");
        std::fs::write(&file, b"PK\x03\x04 truncated").unwrap();

        let result = decompress(&file, tmp.path()).await;
        assert!(matches!(result, Err(Error::Archive(_))));
    }
}
