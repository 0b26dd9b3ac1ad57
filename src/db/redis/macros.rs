/// Read-through caching over an optional Redis cache.
///
/// Looks the key up when a cache is present and returns the hit. On a miss, or
/// when caching is disabled, awaits the block; a successful value is written
/// back in the background. Failed blocks are never cached.
///
/// # Arguments
/// * `$cache`: an `Option<&Cache>`.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: the time-to-live of a written value in seconds.
/// * `$block`: a future producing `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let document: Value = cached!(self.cache.as_ref(), key, ttl, async move {
///     fetch_document().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cache = $cache;
        let key = $key;
        let hit = match cache {
            Some(cache) => cache.get_from_cache(&key).await,
            None => None,
        };

        match hit {
            Some(value) => Ok(value),
            None => match $block.await {
                Ok(value) => {
                    if let Some(cache) = cache {
                        cache.set_in_background(&key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
