use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use log::{debug, info};
use tar::Builder;
use walkdir::WalkDir;
use xz2::write::XzEncoder;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::configuration::Compression;
use crate::error::Error;
use crate::formatter::Formatter;

const XZ_PRESET: u32 = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveResult {
    /// Archive name without extension, taken from the source directory.
    pub base_name: String,
    pub path: PathBuf,
    pub compression: Compression,
    pub size: u64,
}

impl ArchiveResult {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name, self.compression.extension())
    }
}

struct Entry {
    path: PathBuf,
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

/// Packs a directory tree into a single archive file.
///
/// Entries are stored relative to the source directory. An existing archive
/// with the same name is never replaced unless `overwrite` is switched on.
/// A failure in the middle of writing leaves the partial file behind.
#[derive(Clone, Debug, Default)]
pub struct Archiver {
    overwrite: bool,
}

impl Archiver {
    pub fn new() -> Archiver {
        Archiver { overwrite: false }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Archiver {
        self.overwrite = overwrite;
        self
    }

    fn map_error(err: io::Error) -> Error {
        Error::CompressionFailed(format!("{}", err))
    }

    pub fn compress<S: AsRef<Path>, D: AsRef<Path>>(
        &self,
        source: S,
        format: &str,
        destination: D,
    ) -> Result<ArchiveResult, Error> {
        let compression = format.parse::<Compression>()?;
        self.compress_with(source, compression, destination)
    }

    pub fn compress_with<S: AsRef<Path>, D: AsRef<Path>>(
        &self,
        source: S,
        compression: Compression,
        destination: D,
    ) -> Result<ArchiveResult, Error> {
        let source = source.as_ref();
        let destination = destination.as_ref();

        let source_root = match fs::canonicalize(source) {
            Ok(path) if path.is_dir() => path,
            Ok(_) => {
                return Err(Error::CompressionFailed(format!(
                    "'{}' is not a directory",
                    source.display()
                )));
            }
            Err(err) => {
                return Err(Error::CompressionFailed(format!(
                    "unable to read '{}': {}",
                    source.display(),
                    err
                )));
            }
        };
        let base_name = Archiver::base_name(source, &source_root)?;

        if let Err(err) = fs::create_dir_all(destination) {
            return Err(Error::CompressionFailed(format!(
                "unable to create destination '{}': {}",
                destination.display(),
                err
            )));
        }
        let destination = fs::canonicalize(destination).map_err(Archiver::map_error)?;
        let path = destination.join(format!("{}.{}", base_name, compression.extension()));

        let entries = Archiver::collect_entries(&source_root, &path)?;

        info!(
            "creating {} archive: {} ({} entries)",
            compression.method(),
            path.display(),
            entries.len()
        );
        let file = self.create_file(&path)?;

        match compression {
            Compression::Zip => {
                Archiver::write_zip(file, &entries)?;
            }
            Compression::Tar => {
                Archiver::write_tar(file, &entries)?;
            }
            Compression::TarGz => {
                let encoder = GzEncoder::new(file, flate2::Compression::default());
                Archiver::write_tar(encoder, &entries)?
                    .finish()
                    .map_err(Archiver::map_error)?;
            }
            Compression::TarBz2 => {
                let encoder = BzEncoder::new(file, bzip2::Compression::best());
                Archiver::write_tar(encoder, &entries)?
                    .finish()
                    .map_err(Archiver::map_error)?;
            }
            Compression::TarXz => {
                let encoder = XzEncoder::new(file, XZ_PRESET);
                Archiver::write_tar(encoder, &entries)?
                    .finish()
                    .map_err(Archiver::map_error)?;
            }
        }

        let size = fs::metadata(&path).map_err(Archiver::map_error)?.len();
        info!(
            "archive completed: {} ({})",
            path.display(),
            Formatter::format_size(size, 2)
        );

        Ok(ArchiveResult {
            base_name,
            path,
            compression,
            size,
        })
    }

    /// The last path segment as given, so `/a/b/reports/` yields `reports`.
    /// Paths like `.` fall back to the resolved directory name.
    fn base_name(source: &Path, source_root: &Path) -> Result<String, Error> {
        source
            .file_name()
            .or_else(|| source_root.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::CompressionFailed(format!(
                    "unable to derive an archive name from '{}'",
                    source.display()
                ))
            })
    }

    fn collect_entries(source_root: &Path, output: &Path) -> Result<Vec<Entry>, Error> {
        let mut entries = Vec::new();

        for dir_entry in WalkDir::new(source_root).min_depth(1).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|err| Error::CompressionFailed(format!("{}", err)))?;
            if dir_entry.path() == output {
                debug!("skipping the archive itself: {}", output.display());
                continue;
            }

            let relative = dir_entry
                .path()
                .strip_prefix(source_root)
                .map_err(|err| Error::CompressionFailed(format!("{}", err)))?;
            let name = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            entries.push(Entry {
                path: dir_entry.path().to_path_buf(),
                name,
                is_dir: dir_entry.file_type().is_dir(),
                is_symlink: dir_entry.path_is_symlink(),
            });
        }

        Ok(entries)
    }

    fn create_file(&self, path: &Path) -> Result<File, Error> {
        let opened = if self.overwrite {
            File::create(path)
        } else {
            OpenOptions::new().write(true).create_new(true).open(path)
        };

        opened.map_err(|why| match why.kind() {
            ErrorKind::AlreadyExists => Error::CompressionFailed(format!(
                "unable to create file: {} => already exists",
                path.display()
            )),
            ErrorKind::PermissionDenied => Error::CompressionFailed(format!(
                "unable to create file: {} => permission denied",
                path.display()
            )),
            _ => Error::CompressionFailed(format!(
                "unable to create file: {} => {}",
                path.display(),
                why
            )),
        })
    }

    fn write_tar<W: Write>(writer: W, entries: &[Entry]) -> Result<W, Error> {
        let mut tar = Builder::new(writer);
        // links are stored as links, dangling ones included
        tar.follow_symlinks(false);

        for entry in entries {
            debug!("tar: {}", entry.name);
            let appended = if entry.is_dir {
                tar.append_dir(&entry.name, &entry.path)
            } else {
                tar.append_path_with_name(&entry.path, &entry.name)
            };
            if let Err(err) = appended {
                return Err(Error::CompressionFailed(format!(
                    "unable to append '{}': {}",
                    entry.path.display(),
                    err
                )));
            }
        }

        tar.into_inner().map_err(Archiver::map_error)
    }

    fn write_zip(file: File, entries: &[Entry]) -> Result<File, Error> {
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            debug!("zip: {}", entry.name);
            let mut is_dir = entry.is_dir;
            if entry.is_symlink {
                match fs::metadata(&entry.path) {
                    Ok(metadata) => is_dir = metadata.is_dir(),
                    Err(err) => {
                        debug!("skipping dangling link {}: {}", entry.path.display(), err);
                        continue;
                    }
                }
            }

            if is_dir {
                zip.add_directory(entry.name.clone(), options)
                    .map_err(|err| Error::CompressionFailed(format!("{}", err)))?;
                continue;
            }

            zip.start_file(entry.name.clone(), options)
                .map_err(|err| Error::CompressionFailed(format!("{}", err)))?;
            let mut reader = File::open(&entry.path).map_err(|err| {
                Error::CompressionFailed(format!(
                    "unable to read '{}': {}",
                    entry.path.display(),
                    err
                ))
            })?;
            io::copy(&mut reader, &mut zip).map_err(Archiver::map_error)?;
        }

        zip.finish()
            .map_err(|err| Error::CompressionFailed(format!("{}", err)))
    }
}
