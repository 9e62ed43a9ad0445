//! Blocking libcurl transfers used by the handlers.
//!
//! Run these in `spawn_blocking` (see `run_blocking`) when called from async code.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::HandlerError;

fn curl_err(url: &str) -> impl Fn(curl::Error) -> HandlerError + '_ {
    move |source| HandlerError::Transfer {
        url: url.to_string(),
        source,
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> HandlerError + '_ {
    move |source| HandlerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn base_easy(url: &str, headers: &BTreeMap<String, String>) -> Result<curl::easy::Easy, HandlerError> {
    let to_err = curl_err(url);
    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(&to_err)?;
    easy.follow_location(true).map_err(&to_err)?;
    easy.max_redirections(10).map_err(&to_err)?;
    easy.connect_timeout(Duration::from_secs(30)).map_err(&to_err)?;
    easy.low_speed_limit(1024).map_err(&to_err)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(&to_err)?;

    if !headers.is_empty() {
        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))
                .map_err(&to_err)?;
        }
        easy.http_headers(list).map_err(&to_err)?;
    }
    Ok(easy)
}

fn check_status(easy: &mut curl::easy::Easy, url: &str) -> Result<(), HandlerError> {
    let code = easy.response_code().map_err(curl_err(url))?;
    if !(200..300).contains(&code) {
        return Err(HandlerError::Http {
            url: url.to_string(),
            code,
        });
    }
    Ok(())
}

/// GET `url` into `dest`. The body is written to `<dest>.part` and renamed
/// into place only after a 2xx response. Returns bytes written.
pub(super) fn fetch_to_file(
    url: &str,
    headers: &BTreeMap<String, String>,
    dest: &Path,
) -> Result<u64, HandlerError> {
    let mut part_name = dest.as_os_str().to_owned();
    part_name.push(".part");
    let part = Path::new(&part_name).to_path_buf();

    let mut file = fs::File::create(&part).map_err(io_err(&part))?;
    let mut written: u64 = 0;
    let mut write_error: Option<std::io::Error> = None;

    let mut easy = base_easy(url, headers)?;
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    // Returning a short count aborts the transfer.
                    Ok(0)
                }
            })
            .map_err(curl_err(url))?;
        transfer.perform()
    };

    let result = match (write_error, performed) {
        (Some(e), _) => Err(io_err(&part)(e)),
        (None, Err(e)) => Err(curl_err(url)(e)),
        (None, Ok(())) => check_status(&mut easy, url),
    };
    if let Err(e) = result {
        let _ = fs::remove_file(&part);
        return Err(e);
    }

    file.sync_all().map_err(io_err(&part))?;
    drop(file);
    fs::rename(&part, dest).map_err(io_err(dest))?;
    Ok(written)
}

/// POST `body` as JSON to `url`; the response body is discarded.
pub(super) fn post_json(url: &str, body: &[u8]) -> Result<(), HandlerError> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    let mut easy = base_easy(url, &headers)?;
    easy.post(true).map_err(curl_err(url))?;
    easy.post_fields_copy(body).map_err(curl_err(url))?;
    easy.timeout(Duration::from_secs(120)).map_err(curl_err(url))?;
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| Ok(data.len()))
            .map_err(curl_err(url))?;
        transfer.perform().map_err(curl_err(url))?;
    }
    check_status(&mut easy, url)
}
