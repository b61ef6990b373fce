use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use dagfs_dag::{DagResult, LinkRecord, ObjectAccessor, ObjectRecord, PutResult};
use dagfs_types::{ContentHash, Reference};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::transport::{HttpTransport, Request, Transport};
use crate::types::{
    AddResult, BlockStat, FileLs, ObjectLinks, ObjectStat, PeerInfo, ResolvedPath, VersionInfo,
};

/// Typed wrapper around the daemon's endpoints.
///
/// `key` arguments accept anything the daemon resolves: a bare hash or an
/// `/ipfs/…` or `/ipns/…` path.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// A client speaking HTTP to the daemon described by `config`.
    pub fn from_config(config: &ApiConfig) -> ApiResult<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn raw(&self, request: Request) -> ApiResult<Bytes> {
        self.transport.call(&request)
    }

    fn json<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let body = self.transport.call(&request.opt("encoding", "json"))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Identity of the daemon, or of `peer` when given.
    pub fn id(&self, peer: Option<&str>) -> ApiResult<PeerInfo> {
        let mut request = Request::new("/id");
        if let Some(peer) = peer {
            request = request.arg(peer);
        }
        self.json(request)
    }

    pub fn version(&self) -> ApiResult<VersionInfo> {
        self.json(Request::new("/version"))
    }

    /// Resolve `name` to an `/ipfs/<hash>` path.
    pub fn resolve(&self, name: &str, recursive: bool) -> ApiResult<String> {
        let mut request = Request::new("/resolve").arg(name);
        if recursive {
            request = request.opt("recursive", "true");
        }
        let resolved: ResolvedPath = self.json(request)?;
        Ok(resolved.path)
    }

    /// Contents of a unixfs file, assembled by the daemon.
    pub fn cat(&self, key: &str) -> ApiResult<Bytes> {
        self.raw(Request::new("/cat").arg(key))
    }

    /// Store `data` as a unixfs file; the daemon chunks it.
    pub fn add(&self, data: impl Into<Bytes>) -> ApiResult<AddResult> {
        self.json(Request::new("/add").input(data))
    }

    /// Directory listing of the unixfs object at `key`.
    pub fn file_ls(&self, key: &str) -> ApiResult<FileLs> {
        self.json(Request::new(format!("/file/ls/{key}")))
    }

    pub fn object_data(&self, key: &str) -> ApiResult<Bytes> {
        self.raw(Request::new(format!("/object/data/{key}")))
    }

    pub fn object_links(&self, key: &str) -> ApiResult<ObjectLinks> {
        self.json(Request::new(format!("/object/links/{key}")))
    }

    /// The whole node, fetched as a protobuf `PBNode`.
    pub fn object_get(&self, key: &str) -> ApiResult<ObjectRecord> {
        let body = self.raw(Request::new(format!("/object/get/{key}")).opt("encoding", "protobuf"))?;
        Ok(ObjectRecord::decode(body)?)
    }

    /// Store `object`, sent as a protobuf `PBNode`.
    pub fn object_put(&self, object: &ObjectRecord) -> ApiResult<PutResult> {
        let body = object.encode()?;
        self.json(
            Request::new("/object/put")
                .opt("inputenc", "protobuf")
                .input(body),
        )
    }

    pub fn object_stat(&self, key: &str) -> ApiResult<ObjectStat> {
        self.json(Request::new(format!("/object/stat/{key}")))
    }

    /// Create an empty node, or one from a daemon template such as
    /// `unixfs-dir`.
    pub fn object_new(&self, template: Option<&str>) -> ApiResult<PutResult> {
        let mut request = Request::new("/object/new");
        if let Some(template) = template {
            request = request.arg(template);
        }
        self.json(request)
    }

    pub fn object_patch_add_link(
        &self,
        key: &str,
        name: &str,
        target: &ContentHash,
    ) -> ApiResult<PutResult> {
        self.json(
            Request::new(format!("/object/patch/{key}"))
                .arg("add-link")
                .arg(name)
                .arg(target.as_str()),
        )
    }

    pub fn object_patch_rm_link(&self, key: &str, name: &str) -> ApiResult<PutResult> {
        self.json(
            Request::new(format!("/object/patch/{key}"))
                .arg("rm-link")
                .arg(name),
        )
    }

    pub fn object_patch_set_data(&self, _key: &str, _data: &[u8]) -> ApiResult<PutResult> {
        Err(ApiError::NotImplemented("object patch set-data"))
    }

    pub fn object_patch_append_data(&self, _key: &str, _data: &[u8]) -> ApiResult<PutResult> {
        Err(ApiError::NotImplemented("object patch append-data"))
    }

    pub fn block_get(&self, key: &str) -> ApiResult<Bytes> {
        self.raw(Request::new(format!("/block/get/{key}")))
    }

    pub fn block_stat(&self, key: &str) -> ApiResult<BlockStat> {
        self.json(Request::new(format!("/block/stat/{key}")))
    }

    pub fn block_put(&self, data: impl Into<Bytes>) -> ApiResult<BlockStat> {
        self.json(Request::new("/block/put").input(data))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl ObjectAccessor for Client {
    fn object_data(&self, hash: &ContentHash) -> DagResult<Bytes> {
        let data = Client::object_data(self, hash.as_str())?;
        trace!(hash = %hash, bytes = data.len(), "fetched object data");
        Ok(data)
    }

    fn object_links(&self, hash: &ContentHash) -> DagResult<Vec<LinkRecord>> {
        let links = Client::object_links(self, hash.as_str())?.into_links();
        trace!(hash = %hash, links = links.len(), "fetched object links");
        Ok(links)
    }

    fn object_put(&self, object: &ObjectRecord) -> DagResult<PutResult> {
        Ok(Client::object_put(self, object)?)
    }

    fn resolve(&self, reference: &Reference) -> DagResult<ContentHash> {
        if let Some(hash) = reference.direct_hash() {
            return Ok(hash);
        }
        let path = Client::resolve(self, &reference.to_string(), true)?;
        Reference::parse(&path)?
            .direct_hash()
            .ok_or_else(|| ApiError::UnexpectedResponse(format!("resolve returned {path}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use dagfs_dag::{DagError, Merkledag};

    fn client() -> (Arc<MockTransport>, Client) {
        let mock = Arc::new(MockTransport::new());
        let client = Client::new(mock.clone());
        (mock, client)
    }

    fn hash(seed: &[u8]) -> ContentHash {
        ContentHash::compute(seed)
    }

    #[test]
    fn object_data_is_returned_raw() {
        let (mock, client) = client();
        let key = hash(b"k");
        mock.respond(&format!("/object/data/{key}"), b"\x08\x02".to_vec());
        assert_eq!(&client.object_data(key.as_str()).unwrap()[..], b"\x08\x02");
        let req = mock.last();
        assert!(req.args.is_empty());
        assert!(req.options.is_empty());
        assert!(req.input.is_none());
    }

    #[test]
    fn object_links_parses_json() {
        let (mock, client) = client();
        let key = hash(b"root");
        let child = hash(b"child");
        mock.respond(
            &format!("/object/links/{key}"),
            format!(r#"{{"Hash":"{key}","Links":[{{"Name":"a","Hash":"{child}","Size":12}}]}}"#),
        );
        let links = client.object_links(key.as_str()).unwrap();
        assert_eq!(links.hash, key);
        assert_eq!(links.into_links(), vec![LinkRecord::new("a", child, 12)]);
        assert_eq!(mock.last().options, vec![("encoding".to_string(), "json".to_string())]);
    }

    #[test]
    fn null_links_mean_no_links() {
        let (mock, client) = client();
        let key = hash(b"leaf");
        mock.respond(
            &format!("/object/links/{key}"),
            format!(r#"{{"Hash":"{key}","Links":null}}"#),
        );
        let links = ObjectAccessor::object_links(&client, &key).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn object_get_decodes_protobuf() {
        let (mock, client) = client();
        let key = hash(b"node");
        let object = ObjectRecord::new(b"data".to_vec(), vec![LinkRecord::new("x", hash(b"x"), 4)]);
        mock.respond(&format!("/object/get/{key}"), object.encode().unwrap());
        assert_eq!(client.object_get(key.as_str()).unwrap(), object);
        assert_eq!(mock.last().options, vec![("encoding".to_string(), "protobuf".to_string())]);
    }

    #[test]
    fn object_put_sends_protobuf_and_reads_json() {
        let (mock, client) = client();
        let stored = hash(b"stored");
        mock.respond("/object/put", format!(r#"{{"Hash":"{stored}","Links":[]}}"#));
        let object = ObjectRecord::new(b"hello".to_vec(), Vec::new());

        let result = client.object_put(&object).unwrap();
        assert_eq!(result.hash, stored);

        let req = mock.last();
        assert_eq!(ObjectRecord::decode(req.input.unwrap()).unwrap(), object);
        assert_eq!(
            req.options,
            vec![
                ("inputenc".to_string(), "protobuf".to_string()),
                ("encoding".to_string(), "json".to_string())
            ]
        );
    }

    #[test]
    fn patch_requests_carry_subcommand_args() {
        let (mock, client) = client();
        let root = hash(b"root");
        let target = hash(b"target");
        let patched = hash(b"patched");
        let path = format!("/object/patch/{root}");
        mock.respond(&path, format!(r#"{{"Hash":"{patched}"}}"#));

        let added = client.object_patch_add_link(root.as_str(), "n", &target).unwrap();
        assert_eq!(added.hash, patched);
        assert_eq!(mock.last().args, vec!["add-link", "n", target.as_str()]);

        client.object_patch_rm_link(root.as_str(), "n").unwrap();
        assert_eq!(mock.last().args, vec!["rm-link", "n"]);

        assert!(matches!(
            client.object_patch_set_data(root.as_str(), b"x"),
            Err(ApiError::NotImplemented(_))
        ));
        assert!(matches!(
            client.object_patch_append_data(root.as_str(), b"x"),
            Err(ApiError::NotImplemented(_))
        ));
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn object_new_with_template() {
        let (mock, client) = client();
        let empty = hash(b"empty");
        mock.respond("/object/new", format!(r#"{{"Hash":"{empty}"}}"#));
        client.object_new(None).unwrap();
        assert!(mock.last().args.is_empty());
        client.object_new(Some("unixfs-dir")).unwrap();
        assert_eq!(mock.last().args, vec!["unixfs-dir"]);
    }

    #[test]
    fn stats_and_blocks() {
        let (mock, client) = client();
        let key = hash(b"blk");
        mock.respond(
            &format!("/object/stat/{key}"),
            format!(
                r#"{{"Hash":"{key}","NumLinks":2,"BlockSize":90,"LinksSize":80,"DataSize":10,"CumulativeSize":300}}"#
            ),
        );
        mock.respond(&format!("/block/stat/{key}"), format!(r#"{{"Key":"{key}","Size":90}}"#));
        mock.respond(&format!("/block/get/{key}"), b"block".to_vec());
        mock.respond("/block/put", format!(r#"{{"Key":"{key}","Size":5}}"#));

        let stat = client.object_stat(key.as_str()).unwrap();
        assert_eq!(stat.num_links, 2);
        assert_eq!(stat.cumulative_size, 300);
        assert_eq!(client.block_stat(key.as_str()).unwrap().size, 90);
        assert_eq!(&client.block_get(key.as_str()).unwrap()[..], b"block");

        let put = client.block_put(b"block".to_vec()).unwrap();
        assert_eq!(put.key, key.as_str());
        assert_eq!(mock.last().input.as_deref(), Some(&b"block"[..]));
    }

    #[test]
    fn id_version_and_cat() {
        let (mock, client) = client();
        mock.respond("/id", r#"{"ID":"QmPeer","AgentVersion":"go-ipfs/0.4","Addresses":null}"#);
        mock.respond("/version", r#"{"Version":"0.4.2","Commit":"abc"}"#);
        mock.respond("/cat", b"file body".to_vec());

        let id = client.id(Some("QmPeer")).unwrap();
        assert_eq!(id.id, "QmPeer");
        assert_eq!(mock.last().args, vec!["QmPeer"]);
        assert_eq!(client.version().unwrap().version, "0.4.2");
        assert_eq!(&client.cat("/ipfs/QmFile").unwrap()[..], b"file body");
        assert_eq!(mock.last().args, vec!["/ipfs/QmFile"]);
    }

    #[test]
    fn add_uploads_body() {
        let (mock, client) = client();
        let stored = hash(b"added");
        mock.respond("/add", format!(r#"{{"Name":"{stored}","Hash":"{stored}","Size":"17"}}"#));

        let added = client.add(b"new file contents".to_vec()).unwrap();
        assert_eq!(added.hash, stored);
        assert_eq!(added.size, "17");

        let req = mock.last();
        assert_eq!(req.input.as_deref(), Some(&b"new file contents"[..]));
        assert_eq!(req.options, vec![("encoding".to_string(), "json".to_string())]);
    }

    #[test]
    fn file_ls_lists_directory_entries() {
        let (mock, client) = client();
        let dir = hash(b"dir");
        let file = hash(b"file");
        let path = format!("/ipfs/{dir}");
        mock.respond(
            &format!("/file/ls/{path}"),
            format!(
                r#"{{"Arguments":{{"{path}":"{dir}"}},"Objects":{{"{dir}":{{"Hash":"{dir}","Size":0,"Type":"Directory","Links":[{{"Name":"a.txt","Hash":"{file}","Size":5,"Type":"File"}}]}}}}}}"#
            ),
        );
        mock.respond(
            &format!("/file/ls/{file}"),
            format!(
                r#"{{"Arguments":{{"{file}":"{file}"}},"Objects":{{"{file}":{{"Hash":"{file}","Size":5,"Type":"File","Links":null}}}}}}"#
            ),
        );

        let listing = client.file_ls(&path).unwrap();
        let object = listing.object(&path).unwrap();
        assert_eq!(object.kind, "Directory");
        let names: Vec<_> = object.links().iter().map(|l| (l.name.as_str(), l.size)).collect();
        assert_eq!(names, vec![("a.txt", 5)]);
        assert_eq!(object.links()[0].hash, file);
        assert_eq!(mock.last().path, format!("/file/ls/{path}"));

        let leaf = client.file_ls(file.as_str()).unwrap();
        let object = leaf.object(file.as_str()).unwrap();
        assert_eq!(object.kind, "File");
        assert!(object.links().is_empty());
        assert!(leaf.object("/ipfs/elsewhere").is_none());
    }

    #[test]
    fn accessor_resolves_paths_through_daemon() {
        let (mock, client) = client();
        let target = hash(b"site");
        mock.respond("/resolve", format!(r#"{{"Path":"/ipfs/{target}"}}"#));

        let reference = Reference::parse("/ipns/example.org/docs").unwrap();
        assert_eq!(ObjectAccessor::resolve(&client, &reference).unwrap(), target);
        let req = mock.last();
        assert_eq!(req.args, vec!["/ipns/example.org/docs"]);
        assert!(req.options.contains(&("recursive".to_string(), "true".to_string())));

        // bare hashes never hit the daemon
        let before = mock.requests().len();
        ObjectAccessor::resolve(&client, &Reference::Hash(target.clone())).unwrap();
        assert_eq!(mock.requests().len(), before);
    }

    #[test]
    fn daemon_failures_surface_as_transport_errors() {
        let (_mock, client) = client();
        let err = ObjectAccessor::object_data(&client, &hash(b"missing")).unwrap_err();
        assert!(matches!(err, DagError::Transport(_)));
    }

    #[test]
    fn merkledag_over_client() {
        let (mock, client) = client();
        let root = hash(b"root");
        let child = hash(b"child");
        mock.respond(&format!("/object/data/{root}"), b"root data".to_vec());
        mock.respond(
            &format!("/object/links/{root}"),
            format!(r#"{{"Hash":"{root}","Links":[{{"Name":"c","Hash":"{child}","Size":3}}]}}"#),
        );
        mock.respond(&format!("/object/data/{child}"), b"abc".to_vec());

        let dag = Merkledag::new(Arc::new(client));
        let node = dag.node(root);
        assert_eq!(&node.data().unwrap()[..], b"root data");
        assert_eq!(&node.get_node("c").unwrap().data().unwrap()[..], b"abc");

        // cached after the first fetch
        node.data().unwrap();
        let data_calls = mock
            .requests()
            .iter()
            .filter(|r| r.path.starts_with("/object/data/"))
            .count();
        assert_eq!(data_calls, 2);
    }
}
