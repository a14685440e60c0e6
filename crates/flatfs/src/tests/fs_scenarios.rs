// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end behavior through the public facade: content roundtrips at
//! the chunk-size boundaries, chunk layout on the wire, and the documented
//! error surface.

use crate::error::{Error, Result};
use crate::key::{FlatKeys, Kind, ParentLinkStrategy};
use crate::model::MAX_CHUNK_SIZE;
use crate::store::{EntityStore, Filter, OrderBy, Query};
use crate::stream::OpenMode;

use super::{chunk_keys_of, patterned, read_file, test_fs, write_file};

#[tokio::test]
async fn test_content_roundtrips_at_boundary_sizes() -> Result<()> {
    let (fs, store) = test_fs().await?;
    let sizes = [
        0,
        1,
        MAX_CHUNK_SIZE - 1,
        MAX_CHUNK_SIZE,
        MAX_CHUNK_SIZE + 1,
        MAX_CHUNK_SIZE * 5 / 2,
    ];
    for (i, size) in sizes.into_iter().enumerate() {
        let path = format!("/f{i}");
        let content = patterned(size);
        write_file(&fs, &path, &content).await?;

        assert_eq!(read_file(&fs, &path).await?, content, "size {size}");
        assert_eq!(fs.stat(&path).await?.size, size as u64);

        let chunks = chunk_keys_of(&store, &path).await?;
        assert_eq!(chunks.len(), size.div_ceil(MAX_CHUNK_SIZE), "size {size}");
        for (slot, key) in chunks.iter().enumerate() {
            assert_eq!(
                FlatKeys.chunk_offset(key),
                Some((slot * MAX_CHUNK_SIZE) as u64)
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_scenario() -> Result<()> {
    let (fs, store) = test_fs().await?;
    fs.mkdir("/projects").await?;
    fs.mkdir("/projects/demo").await?;

    let content = patterned(MAX_CHUNK_SIZE * 5 / 2);
    write_file(&fs, "/projects/demo/data.bin", &content).await?;

    assert_eq!(fs.stat("/projects/demo/data.bin").await?.size, content.len() as u64);
    assert_eq!(fs.listdir("/projects").await?, vec!["demo"]);
    assert_eq!(fs.listdir("/projects/demo").await?, vec!["data.bin"]);

    let copied = fs
        .copyfile("/projects/demo/data.bin", "/projects/demo/copy.bin")
        .await?;
    assert_eq!(copied, content.len() as u64);
    assert_eq!(read_file(&fs, "/projects/demo/copy.bin").await?, content);

    fs.unlink("/projects/demo/data.bin").await?;
    assert_eq!(fs.listdir("/projects/demo").await?, vec!["copy.bin"]);
    assert!(fs.checker().scan().await?.is_clean());

    fs.rmdir("/projects", true).await?;
    assert!(fs.listdir("/").await?.is_empty());
    assert!(fs.checker().scan().await?.is_clean());
    // only the root record remains
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_unlink_removes_chunks() -> Result<()> {
    let (fs, store) = test_fs().await?;
    write_file(&fs, "/big", &patterned(MAX_CHUNK_SIZE * 2 + 17)).await?;
    assert_eq!(chunk_keys_of(&store, "/big").await?.len(), 3);

    fs.unlink("/big").await?;
    assert!(chunk_keys_of(&store, "/big").await?.is_empty());
    assert_eq!(store.len().await, 1);
    assert!(matches!(fs.stat("/big").await, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_cache_serves_fresh_data_after_rewrite() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    write_file(&fs, "/f", b"first version").await?;
    assert_eq!(read_file(&fs, "/f").await?, b"first version");

    write_file(&fs, "/f", b"second").await?;
    assert_eq!(read_file(&fs, "/f").await?, b"second");
    assert_eq!(fs.stat("/f").await?.size, 6);

    // repeated stats are answered from cache
    let before = fs.cache_stats().await;
    fs.stat("/f").await?;
    fs.stat("/f").await?;
    let after = fs.cache_stats().await;
    assert!(after.hits >= before.hits + 2);
    Ok(())
}

#[tokio::test]
async fn test_dir_records_unaffected_by_child_writes() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    fs.mkdir("/d").await?;
    let before = fs.stat("/d").await?;

    write_file(&fs, "/d/f", &patterned(1024)).await?;
    let after = fs.stat("/d").await?;

    // no aggregate size, no timestamp propagation
    assert_eq!(after.size, 0);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.modified_at, before.modified_at);
    Ok(())
}

#[tokio::test]
async fn test_open_kind_mismatches() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    fs.mkdir("/d").await?;

    assert!(matches!(
        fs.open("/d", OpenMode::Read).await,
        Err(Error::FileExpected(_))
    ));
    assert!(matches!(
        fs.open("/d", OpenMode::Write).await,
        Err(Error::FileExpected(_))
    ));
    assert!(matches!(
        fs.open("/d", OpenMode::ExclusiveCreate).await,
        Err(Error::AlreadyExists(_))
    ));
    assert!(matches!(
        fs.open("/missing", OpenMode::Read).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        fs.open("/missing", OpenMode::ReadWrite).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_truncate_trims_straddling_chunk() -> Result<()> {
    let (fs, store) = test_fs().await?;
    let content = patterned(MAX_CHUNK_SIZE * 5 / 2);
    write_file(&fs, "/t", &content).await?;

    let mut stream = fs.open("/t", OpenMode::ReadWrite).await?;
    let cut = (MAX_CHUNK_SIZE * 3 / 2) as u64;
    stream.truncate(cut).await?;
    stream.close().await?;

    assert_eq!(fs.stat("/t").await?.size, cut);
    assert_eq!(read_file(&fs, "/t").await?, &content[..cut as usize]);

    let file = FlatKeys.file_key("/t");
    let chunks = store
        .query(
            &Query::kind(Kind::Chunk)
                .filter(Filter::File(file))
                .order(OrderBy::Offset),
        )
        .await?;
    assert_eq!(chunks.len(), 2);
    // the straddling chunk was trimmed in the store, not just clamped on read
    let tail = chunks[1].1.as_chunk().map(|c| c.data.len());
    assert_eq!(tail, Some(MAX_CHUNK_SIZE / 2));
    Ok(())
}

#[tokio::test]
async fn test_sparse_write_reads_zeros_and_stores_no_hole_chunks() -> Result<()> {
    let (fs, store) = test_fs().await?;
    let mut stream = fs.open("/sparse", OpenMode::Write).await?;
    stream.seek((MAX_CHUNK_SIZE + 10) as u64)?;
    stream.write(b"tail").await?;
    stream.close().await?;

    assert_eq!(fs.stat("/sparse").await?.size, (MAX_CHUNK_SIZE + 14) as u64);
    // the untouched first slot has no record at all
    let chunks = chunk_keys_of(&store, "/sparse").await?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(FlatKeys.chunk_offset(&chunks[0]), Some(MAX_CHUNK_SIZE as u64));

    let mut expected = vec![0u8; MAX_CHUNK_SIZE + 10];
    expected.extend_from_slice(b"tail");
    assert_eq!(read_file(&fs, "/sparse").await?, expected);
    Ok(())
}

#[tokio::test]
async fn test_copy_overwrites_longer_destination() -> Result<()> {
    let (fs, store) = test_fs().await?;
    write_file(&fs, "/src", b"short").await?;
    write_file(&fs, "/dst", &patterned(MAX_CHUNK_SIZE + 100)).await?;

    let copied = fs.copyfile("/src", "/dst").await?;
    assert_eq!(copied, 5);
    assert_eq!(read_file(&fs, "/dst").await?, b"short");
    assert_eq!(chunk_keys_of(&store, "/dst").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_readwrite_patches_in_place() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    write_file(&fs, "/f", b"0123456789").await?;

    let mut stream = fs.open("/f", OpenMode::ReadWrite).await?;
    stream.seek(2)?;
    stream.write(b"XY").await?;
    stream.close().await?;

    assert_eq!(read_file(&fs, "/f").await?, b"01XY456789");
    assert_eq!(fs.stat("/f").await?.size, 10);
    Ok(())
}

#[tokio::test]
async fn test_root_is_protected() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    assert!(matches!(fs.rmdir("/", false).await, Err(Error::RootProtected)));
    assert!(matches!(fs.rmdir("/", true).await, Err(Error::RootProtected)));
    assert!(matches!(fs.mkdir("/").await, Err(Error::AlreadyExists(_))));
    assert_eq!(fs.stat("/").await?.kind, Kind::Dir);
    Ok(())
}

#[tokio::test]
async fn test_rmdir_nonempty_requires_recursive() -> Result<()> {
    let (fs, store) = test_fs().await?;
    fs.mkdir("/d").await?;
    fs.mkdir("/d/sub").await?;
    write_file(&fs, "/d/a", b"top").await?;
    write_file(&fs, "/d/sub/f", &patterned(MAX_CHUNK_SIZE + 1)).await?;

    let before = fs.listdir("/d").await?;
    assert_eq!(before, vec!["a", "sub"]);
    assert!(matches!(
        fs.rmdir("/d", false).await,
        Err(Error::DirectoryNotEmpty(_))
    ));
    // the refused removal left the directory and its listing intact
    assert!(fs.isdir("/d").await?);
    assert_eq!(fs.listdir("/d").await?, before);

    fs.rmdir("/d", true).await?;
    assert!(!fs.exists("/d").await?);
    assert_eq!(store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_trailing_slash_and_root_aliases() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    assert!(fs.isdir("///").await?);
    fs.mkdir("/x/").await?;
    assert!(fs.isdir("/x").await?);
    assert_eq!(fs.stat("/x/").await?.kind, Kind::Dir);
    Ok(())
}

#[tokio::test]
async fn test_list_entries_pagination_and_metadata() -> Result<()> {
    let (fs, _store) = test_fs().await?;
    for name in ["a", "c", "e"] {
        fs.mkdir(&format!("/{name}")).await?;
    }
    write_file(&fs, "/b", b"bb").await?;
    write_file(&fs, "/d", b"dddd").await?;

    let page = fs.list_entries("/", Some(2), 1).await?;
    let names: Vec<_> = page.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
    assert_eq!(page[0].meta.kind, Kind::File);
    assert_eq!(page[0].meta.size, 2);
    assert_eq!(page[1].meta.kind, Kind::Dir);
    assert_eq!(page[0].path, "/b");
    Ok(())
}
