use std::env;
use std::path::{Path, PathBuf};

use duc_restore::RawDataState;
use thiserror::Error;
use tracing::{info, warn};

/// 文档来源，便于概览呈现加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    File(PathBuf),
    Demo,
}

/// 统一封装解析后的宽松文档树与元信息。
#[derive(Debug)]
pub struct LoadedDocument {
    pub raw: RawDataState,
    pub source: DocumentSource,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("读取文档 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析文档 {path:?} 失败: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 读取 JSON 文件并解析为宽松文档树。解析只要求顶层是对象，
/// 字段级的降级与修复留给恢复层。
pub fn load_document(path: &Path) -> Result<LoadedDocument, LoaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawDataState = serde_json::from_str(&text).map_err(|source| LoaderError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "从 JSON 加载文档成功");
    Ok(LoadedDocument {
        raw,
        source: DocumentSource::File(path.to_path_buf()),
    })
}

/// 从环境变量 `DUC_SAMPLE_JSON` 指定的路径加载文档，
/// 若失败则回退到内置示例。
pub fn load_document_from_env_or_demo() -> LoadedDocument {
    if let Some(path) = env::var_os("DUC_SAMPLE_JSON") {
        let path = PathBuf::from(path);
        match load_document(&path) {
            Ok(loaded) => return loaded,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载示例文档失败，回退到内置示例");
            }
        }
    }

    LoadedDocument {
        raw: demo_document(),
        source: DocumentSource::Demo,
    }
}

/// 内置示例文档，带历史形态字段（扁平样式、legacy 类型、元组点位、标识冲突）。
fn demo_document() -> RawDataState {
    match serde_json::from_str(DEMO_DOCUMENT) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "内置示例解析失败，使用空文档");
            RawDataState::default()
        }
    }
}

const DEMO_DOCUMENT: &str = r##"{
  "type": "duc",
  "source": "built-in-demo",
  "id": "demo-duc",
  "ducGlobalState": {
    "mainScope": "mm",
    "viewBackgroundColor": "#F5F5F0"
  },
  "ducLocalState": {
    "scope": "mm"
  },
  "standards": [
    { "id": "std-gb", "label": "GB/T 机械制图", "version": 1 }
  ],
  "dictionary": {
    "project": "演示装配"
  },
  "layers": [
    { "id": "lyr-body", "label": "轮廓" }
  ],
  "blocks": [
    {
      "id": "blk-bolt",
      "label": "六角螺栓",
      "version": 1,
      "attributeDefinitions": {
        "SIZE": { "defaultValue": "M8", "prompt": "规格" }
      },
      "elements": [
        {
          "type": "polygon",
          "id": "bolt-head",
          "sides": 6,
          "width": 12,
          "height": 12,
          "updated": 1700000000000
        }
      ]
    }
  ],
  "elements": [
    {
      "type": "rectangle",
      "id": "plate",
      "label": "底板",
      "x": 0,
      "y": 0,
      "width": 120,
      "height": 80,
      "strokeColor": "#335577",
      "backgroundColor": "#EEF2F7",
      "updated": 1700000000000
    },
    {
      "type": "diamond",
      "id": "vent",
      "x": 20,
      "y": 20,
      "width": 24,
      "height": 24,
      "updated": 1700000000000
    },
    {
      "type": "ellipse",
      "id": "plate",
      "x": 70,
      "y": 30,
      "width": 30,
      "height": 18,
      "ratio": 0.6,
      "updated": 1700000000000
    },
    {
      "type": "arrow",
      "id": "flow",
      "x": 10,
      "y": 110,
      "points": [[0, 0], [45, 12]],
      "updated": 1700000000000
    },
    {
      "type": "text",
      "id": "title",
      "x": 4,
      "y": -24,
      "width": 88,
      "height": 18,
      "text": "示例装配 1:1",
      "font": "14 SimHei",
      "updated": 1700000000000
    },
    {
      "type": "blockinstance",
      "id": "bolt-1",
      "blockId": "blk-bolt",
      "x": 30,
      "y": 40,
      "width": 12,
      "height": 12,
      "attributeValues": { "SIZE": "M10" },
      "updated": 1700000000000
    },
    {
      "type": "freedraw",
      "id": "sketch",
      "x": 90,
      "y": 90,
      "points": [[0, 0], [3, 5], [9, 4]],
      "pressures": [0.4, 0.7, 0.9],
      "updated": 1700000000000
    }
  ]
}"##;
