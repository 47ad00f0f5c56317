//! Directory-backed [`ResponseCache`] that keeps one JSON file per cached request.

// std
use std::{
	env,
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CacheKey, CachedResponse, ResponseCache},
	transport::{ApiRequest, ApiResponse},
};

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Persists each cached response to `<dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileCache {
	dir: PathBuf,
}
impl FileCache {
	/// Directory used when no cache store is configured: `./var/cache`, made absolute.
	pub fn default_dir() -> Result<PathBuf, CacheError> {
		let cwd = env::current_dir().map_err(|e| CacheError::Backend {
			message: format!("Failed to resolve the working directory: {e}"),
		})?;

		Ok(cwd.join("var").join("cache"))
	}

	/// Opens (or creates) a cache rooted at `dir`.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| CacheError::Backend {
			message: format!("Failed to create cache directory {}: {e}", dir.display()),
		})?;

		Ok(Self { dir })
	}

	/// Root directory of the cache.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn entry_path(&self, key: &CacheKey) -> PathBuf {
		self.dir.join(format!("{key}.json"))
	}

	fn read_entry(path: &Path) -> Result<Option<CachedResponse>, CacheError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => {
				return Err(CacheError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				});
			},
		};
		let entry = serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})?;

		Ok(Some(entry))
	}

	fn write_entry(path: &Path, entry: &CachedResponse) -> Result<(), CacheError> {
		let serialized = serde_json::to_vec(entry).map_err(|e| CacheError::Serialization {
			message: format!("Failed to serialize cache entry: {e}"),
		})?;
		// Writers of the same key must never share a temp file.
		let mut tmp_path = path.to_path_buf();

		tmp_path.set_extension(format!(
			"{}.{}.tmp",
			process::id(),
			WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
		));

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}
}
impl ResponseCache for FileCache {
	fn lookup<'a>(
		&'a self,
		request: &'a ApiRequest,
		max_age: Duration,
	) -> CacheFuture<'a, Option<ApiResponse>> {
		Box::pin(async move {
			let path = self.entry_path(&CacheKey::for_request(request));
			let now = OffsetDateTime::now_utc();

			match Self::read_entry(&path)? {
				Some(entry) if entry.is_fresh_at(now, max_age) => entry.to_response().map(Some),
				Some(entry) => {
					if now >= entry.expires_at {
						// A failed removal is retried on the next lookup.
						let _ = fs::remove_file(&path);
					}

					Ok(None)
				},
				None => Ok(None),
			}
		})
	}

	fn store<'a>(
		&'a self,
		request: &'a ApiRequest,
		response: &'a ApiResponse,
		max_age: Duration,
	) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			let path = self.entry_path(&CacheKey::for_request(request));
			let entry = CachedResponse::capture(response, OffsetDateTime::now_utc(), max_age);

			Self::write_entry(&path, &entry)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::{HeaderMap, StatusCode};
	// self
	use super::*;

	fn temp_dir() -> PathBuf {
		let unique = format!(
			"apiclient_file_cache_{}_{}",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn fixture() -> (ApiRequest, ApiResponse) {
		let url = Url::parse("https://api.example.com/v1/items?page=2")
			.expect("Fixture URL should parse successfully.");

		(ApiRequest::get(url), ApiResponse::new(StatusCode::OK, HeaderMap::new(), b"[1]".to_vec()))
	}

	fn cleanup(dir: &Path) {
		fs::remove_dir_all(dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file cache {}: {e}", dir.display())
		});
	}

	#[tokio::test]
	async fn store_and_reopen_round_trip() {
		let dir = temp_dir();
		let cache = FileCache::open(&dir).expect("Failed to open file cache directory.");
		let (request, response) = fixture();

		cache
			.store(&request, &response, Duration::hours(1))
			.await
			.expect("Failed to store fixture response in file cache.");
		drop(cache);

		let reopened = FileCache::open(&dir).expect("Failed to reopen file cache directory.");
		let hit = reopened
			.lookup(&request, Duration::hours(1))
			.await
			.expect("Failed to look up fixture response.")
			.expect("File cache lost the entry after reopen.");

		assert_eq!(hit.body, b"[1]");
		assert!(hit.is_cached());

		cleanup(&dir);
	}

	#[tokio::test]
	async fn corrupt_entry_surfaces_serialization_error() {
		let dir = temp_dir();
		let cache = FileCache::open(&dir).expect("Failed to open file cache directory.");
		let (request, _) = fixture();

		fs::write(cache.entry_path(&CacheKey::for_request(&request)), b"not json")
			.expect("Failed to plant a corrupt cache entry.");

		let err = cache
			.lookup(&request, Duration::hours(1))
			.await
			.expect_err("Corrupt entries should surface as cache errors.");

		assert!(matches!(err, CacheError::Serialization { .. }));

		cleanup(&dir);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
	async fn concurrent_stores_of_one_key_all_succeed() {
		let dir = temp_dir();
		let cache = FileCache::open(&dir).expect("Failed to open file cache directory.");
		let (request, response) = fixture();
		let handles = (0..8)
			.map(|_| {
				let cache = cache.clone();
				let request = request.clone();
				let response = response.clone();

				tokio::spawn(async move {
					for _ in 0..25 {
						cache.store(&request, &response, Duration::hours(1)).await?;
					}

					Ok::<_, CacheError>(())
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			handle
				.await
				.expect("Store task should not panic.")
				.expect("Concurrent stores of the same key should all succeed.");
		}

		let hit = cache
			.lookup(&request, Duration::hours(1))
			.await
			.expect("Failed to look up fixture response.")
			.expect("Entry should be present after concurrent stores.");
		let leftovers = fs::read_dir(&dir)
			.expect("Failed to list cache directory.")
			.filter_map(Result::ok)
			.filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
			.count();

		assert_eq!(hit.body, b"[1]");
		assert_eq!(leftovers, 0);

		cleanup(&dir);
	}

	#[tokio::test]
	async fn expired_entry_is_removed() {
		let dir = temp_dir();
		let cache = FileCache::open(&dir).expect("Failed to open file cache directory.");
		let (request, response) = fixture();
		let path = cache.entry_path(&CacheKey::for_request(&request));

		cache
			.store(&request, &response, Duration::ZERO)
			.await
			.expect("Failed to store fixture response in file cache.");

		assert!(path.exists());
		assert!(
			cache
				.lookup(&request, Duration::hours(1))
				.await
				.expect("Failed to look up fixture response.")
				.is_none()
		);
		assert!(!path.exists());

		cleanup(&dir);
	}
}
