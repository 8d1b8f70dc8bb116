//! Quark drive API client.
//!
//! Thin, stateless wrapper over the HTTP endpoints: one method per
//! endpoint, pagination folded in, envelope codes turned into structured
//! errors. The sync engine consumes it through the [`DriveGateway`]
//! trait; nothing here caches or retries beyond the transport layer.

use crate::credential::QuarkCredential;
use crate::error::{QuarkError, Result};
use crate::types::{
    AccountData, DriveFile, Envelope, GrowthData, ListData, NewDirData, PathEntry, RecycleFile,
    SaveData, ShareFile, SignData, TaskData, TokenData,
};
use async_trait::async_trait;
use chrono::Utc;
use core_http::{HttpClient, HttpRequest, HttpResponse};
use core_sync::{
    AccountInfo, DriveEntry, DriveGateway, GrowthInfo, PathFid, RecycleRecord, ResolvedShare,
    ShareEntry, TaskPoll,
};
use rand::Rng;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::debug;

const PC_BASE: &str = "https://drive-pc.quark.cn/1/clouddrive";
const GROWTH_BASE: &str = "https://drive-m.quark.cn/1/clouddrive/capacity/growth";
const ACCOUNT_INFO_URL: &str = "https://pan.quark.cn/account/info?fr=pc&platform=pc";
const REFERER: &str = "https://pan.quark.cn/";

const LIST_SORT: &str = "file_type:asc,updated_at:desc";

/// Share URL anatomy: id, optional passcode, optional subfolder fragment
/// ending in the directory fid to start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareUrlParts {
    pub pwd_id: String,
    pub passcode: String,
    pub root_fid: String,
}

fn share_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)(\?pwd=(\w+))?(#/list/share.*/(\w+))?").unwrap())
}

/// Parse a share URL of the form
/// `https://pan.quark.cn/s/<id>[?pwd=<code>][#/list/share/.../<fid>]`.
pub fn parse_share_url(url: &str) -> Result<ShareUrlParts> {
    let tail = match url.find("/s/") {
        Some(at) => &url[at + 3..],
        None => url,
    };
    let captures = share_url_re()
        .captures(tail)
        .filter(|c| !c[1].is_empty())
        .ok_or_else(|| QuarkError::ShareInvalid(format!("unrecognized share URL: {url}")))?;

    Ok(ShareUrlParts {
        pwd_id: captures[1].to_string(),
        passcode: captures.get(3).map_or(String::new(), |m| m.as_str().to_string()),
        root_fid: captures
            .get(5)
            .map_or_else(|| "0".to_string(), |m| m.as_str().to_string()),
    })
}

pub struct QuarkClient {
    http: Arc<dyn HttpClient>,
    credential: QuarkCredential,
    page_size: u32,
}

impl QuarkClient {
    pub fn new(http: Arc<dyn HttpClient>, cookie: &str, page_size: u32) -> Self {
        Self {
            http,
            credential: QuarkCredential::parse(cookie),
            page_size: page_size.max(1),
        }
    }

    fn decorate(&self, request: HttpRequest) -> HttpRequest {
        let request = request
            .header("cookie", self.credential.cookie())
            .header("referer", REFERER);
        match self.credential.session_token() {
            Some(st) => request.header("x-clouddrive-st", st),
            None => request,
        }
    }

    /// Growth endpoints authenticate with query parameters instead of the
    /// cookie alone.
    fn mobile_query(&self) -> Result<String> {
        let mobile = self
            .credential
            .mobile()
            .ok_or_else(|| QuarkError::Credential("mobile-auth parameters absent".to_string()))?;
        Ok(format!(
            "pr=ucpro&fr=android&kps={}&sign={}&vcode={}",
            urlencoding::encode(&mobile.kps),
            urlencoding::encode(&mobile.sign),
            urlencoding::encode(&mobile.vcode),
        ))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<Envelope<T>> {
        let response = self.http.execute(self.decorate(request)).await?;
        parse_envelope(&response)
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        field: &'static str,
    ) -> Result<T> {
        let envelope = self.fetch::<T>(request).await?;
        unwrap_data(envelope, field)
    }

    /// Copy-task cache-buster parameters.
    fn save_timing() -> (i64, u64) {
        let dt = rand::thread_rng().gen_range(60_000..300_000);
        (Utc::now().timestamp_millis(), dt)
    }
}

fn parse_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<Envelope<T>> {
    response.json::<Envelope<T>>().map_err(|_| {
        // The gateway answers overload and auth walls with HTML pages.
        QuarkError::Malformed(format!(
            "non-JSON response (status {}): {:.120}",
            response.status,
            response.text()
        ))
    })
}

fn unwrap_data<T>(envelope: Envelope<T>, field: &'static str) -> Result<T> {
    if envelope.code != 0 {
        return Err(QuarkError::Api {
            code: envelope.code,
            message: envelope.message,
        });
    }
    envelope.data.ok_or(QuarkError::MissingField(field))
}

#[async_trait]
impl DriveGateway for QuarkClient {
    async fn account_info(&self) -> core_sync::Result<AccountInfo> {
        // This endpoint has no envelope code; a guest session gets `data: null`.
        let request = HttpRequest::get(ACCOUNT_INFO_URL);
        let envelope = self.fetch::<AccountData>(request).await?;
        let data = envelope
            .data
            .ok_or(QuarkError::Credential("cookie is not signed in".to_string()))?;
        Ok(AccountInfo {
            nickname: data.nickname,
        })
    }

    fn has_account_cookie(&self) -> bool {
        self.credential.has_account_cookie()
    }

    fn has_mobile_auth(&self) -> bool {
        self.credential.mobile().is_some()
    }

    async fn growth_info(&self) -> core_sync::Result<GrowthInfo> {
        let url = format!("{}/info?{}", GROWTH_BASE, self.mobile_query()?);
        let data: GrowthData = self.fetch_data(HttpRequest::get(url), "data").await?;
        Ok(GrowthInfo {
            vip: data.vip,
            total_capacity: data.total_capacity,
            sign_reward: data.cap_composition.sign_reward,
            signed_today: data.cap_sign.sign_daily,
            daily_reward: data.cap_sign.sign_daily_reward,
            sign_progress: data.cap_sign.sign_progress,
            sign_target: data.cap_sign.sign_target,
        })
    }

    async fn growth_sign(&self) -> core_sync::Result<u64> {
        let url = format!("{}/sign?{}", GROWTH_BASE, self.mobile_query()?);
        let request = HttpRequest::post(url)
            .json(&json!({"sign_cyclic": true}))
            .map_err(QuarkError::from)?;
        let data: SignData = self.fetch_data(request, "data").await?;
        Ok(data.sign_daily_reward)
    }

    async fn resolve_share(&self, shareurl: &str) -> core_sync::Result<ResolvedShare> {
        let parts = parse_share_url(shareurl)?;
        let url = format!("{}/share/sharepage/token?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({"pwd_id": parts.pwd_id, "passcode": parts.passcode}))
            .map_err(QuarkError::from)?;

        let envelope = self.fetch::<TokenData>(request).await?;
        if envelope.code != 0 {
            // Expired/withdrawn shares come back as an envelope error.
            return Err(QuarkError::ShareInvalid(envelope.message).into());
        }
        let stoken = envelope
            .data
            .map(|d| d.stoken)
            .filter(|s| !s.is_empty())
            .ok_or(QuarkError::MissingField("stoken"))?;

        Ok(ResolvedShare {
            pwd_id: parts.pwd_id,
            stoken,
            root_fid: parts.root_fid,
        })
    }

    async fn list_share(
        &self,
        share: &ResolvedShare,
        pdir_fid: &str,
    ) -> core_sync::Result<Vec<ShareEntry>> {
        let mut entries = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = format!(
                "{}/share/sharepage/detail?pr=ucpro&fr=pc&pwd_id={}&stoken={}&pdir_fid={}&force=0&_page={}&_size={}&_fetch_banner=0&_fetch_share=0&_fetch_total=1&_sort={}",
                PC_BASE,
                share.pwd_id,
                urlencoding::encode(&share.stoken),
                pdir_fid,
                page,
                self.page_size,
                LIST_SORT,
            );
            let envelope = self.fetch::<ListData<ShareFile>>(HttpRequest::get(url)).await?;
            let total = envelope.metadata.total;
            let list = unwrap_data(envelope, "data.list")?.list;
            let fetched = list.len();

            entries.extend(list.into_iter().map(|f| ShareEntry {
                fid: f.fid,
                file_name: f.file_name,
                dir: f.dir,
                obj_category: f.obj_category,
                share_fid_token: f.share_fid_token,
            }));

            if fetched < self.page_size as usize || (total > 0 && entries.len() as u64 >= total) {
                break;
            }
            page += 1;
        }
        debug!(pdir_fid = %pdir_fid, count = entries.len(), "Listed share directory");
        Ok(entries)
    }

    async fn list_dir(&self, pdir_fid: &str) -> core_sync::Result<Vec<DriveEntry>> {
        let mut entries = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = format!(
                "{}/file/sort?pr=ucpro&fr=pc&pdir_fid={}&_page={}&_size={}&_fetch_total=1&_fetch_sub_dirs=0&_sort={}",
                PC_BASE, pdir_fid, page, self.page_size, LIST_SORT,
            );
            let envelope = self.fetch::<ListData<DriveFile>>(HttpRequest::get(url)).await?;
            let total = envelope.metadata.total;
            let list = unwrap_data(envelope, "data.list")?.list;
            let fetched = list.len();

            entries.extend(list.into_iter().map(|f| DriveEntry {
                fid: f.fid,
                file_name: f.file_name,
                dir: f.dir,
                created_at: f.created_at,
            }));

            if fetched < self.page_size as usize || (total > 0 && entries.len() as u64 >= total) {
                break;
            }
            page += 1;
        }
        Ok(entries)
    }

    async fn resolve_paths(&self, paths: &[String]) -> core_sync::Result<Vec<PathFid>> {
        let url = format!("{}/file/info/path_list?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({"file_path": paths, "namespace": "0"}))
            .map_err(QuarkError::from)?;
        let found: Vec<PathEntry> = self.fetch_data(request, "data").await?;
        Ok(found
            .into_iter()
            .map(|p| PathFid {
                file_path: p.file_path,
                fid: p.fid,
            })
            .collect())
    }

    async fn mkdir(&self, dir_path: &str) -> core_sync::Result<String> {
        let url = format!("{}/file?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({
                "pdir_fid": "0",
                "file_name": "",
                "dir_path": dir_path,
                "dir_init_lock": false,
            }))
            .map_err(QuarkError::from)?;
        let data: NewDirData = self
            .fetch_data(request, "data.fid")
            .await
            .map_err(|e| core_sync::SyncError::DirectoryCreate {
                path: dir_path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(data.fid)
    }

    async fn save_entries(
        &self,
        share: &ResolvedShare,
        fids: &[String],
        fid_tokens: &[String],
        to_pdir_fid: &str,
    ) -> core_sync::Result<String> {
        let (t, dt) = Self::save_timing();
        let url = format!(
            "{}/share/sharepage/save?pr=ucpro&fr=pc&app=clouddrive&__dt={}&__t={}",
            PC_BASE, dt, t,
        );
        let request = HttpRequest::post(url)
            .json(&json!({
                "fid_list": fids,
                "fid_token_list": fid_tokens,
                "to_pdir_fid": to_pdir_fid,
                "pwd_id": share.pwd_id,
                "stoken": share.stoken,
                "pdir_fid": "0",
                "scene": "link",
            }))
            .map_err(QuarkError::from)?;
        let data: SaveData = self.fetch_data(request, "data.task_id").await?;
        Ok(data.task_id)
    }

    async fn poll_task(&self, task_id: &str, retry_index: u32) -> core_sync::Result<TaskPoll> {
        let url = format!(
            "{}/task?pr=ucpro&fr=pc&task_id={}&retry_index={}",
            PC_BASE, task_id, retry_index,
        );
        let data: TaskData = self.fetch_data(HttpRequest::get(url), "data").await?;
        Ok(TaskPoll {
            status: data.status,
            title: data.task_title,
        })
    }

    async fn rename(&self, fid: &str, file_name: &str) -> core_sync::Result<()> {
        let url = format!("{}/file/rename?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({"fid": fid, "file_name": file_name}))
            .map_err(QuarkError::from)?;
        let envelope = self.fetch::<serde_json::Value>(request).await?;
        if envelope.code != 0 {
            return Err(QuarkError::Api {
                code: envelope.code,
                message: envelope.message,
            }
            .into());
        }
        Ok(())
    }

    async fn delete(&self, fids: &[String]) -> core_sync::Result<()> {
        let url = format!("{}/file/delete?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({"action_type": 2, "filelist": fids, "exclude_fids": []}))
            .map_err(QuarkError::from)?;
        let envelope = self.fetch::<serde_json::Value>(request).await?;
        if envelope.code != 0 {
            return Err(QuarkError::Api {
                code: envelope.code,
                message: envelope.message,
            }
            .into());
        }
        Ok(())
    }

    async fn recycle_list(&self) -> core_sync::Result<Vec<RecycleRecord>> {
        let url = format!(
            "{}/file/recycle/list?pr=ucpro&fr=pc&_page=1&_size=30",
            PC_BASE,
        );
        let data: ListData<RecycleFile> = self.fetch_data(HttpRequest::get(url), "data").await?;
        Ok(data
            .list
            .into_iter()
            .map(|r| RecycleRecord {
                record_id: r.record_id,
                fid: r.fid,
            })
            .collect())
    }

    async fn recycle_purge(&self, record_ids: &[String]) -> core_sync::Result<()> {
        let url = format!("{}/file/recycle/remove?pr=ucpro&fr=pc", PC_BASE);
        let request = HttpRequest::post(url)
            .json(&json!({"select_mode": 2, "record_list": record_ids}))
            .map_err(QuarkError::from)?;
        let envelope = self.fetch::<serde_json::Value>(request).await?;
        if envelope.code != 0 {
            return Err(QuarkError::Api {
                code: envelope.code,
                message: envelope.message,
            }
            .into());
        }
        Ok(())
    }
}
