// 该文件是 Qianli （千里眼） 项目的一部分。
// src/labels.rs - 类别名称目录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 有序、按索引寻址的类别名称目录
#[derive(Debug, Clone, Copy)]
pub struct ClassCatalog {
  names: &'static [&'static str],
}

impl Default for ClassCatalog {
  fn default() -> Self {
    Self::coco()
  }
}

impl ClassCatalog {
  /// COCO 80 类目录
  pub const fn coco() -> Self {
    Self {
      names: &COCO_CLASSES,
    }
  }

  pub const fn len(&self) -> usize {
    self.names.len()
  }

  pub const fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// 按索引取类别名称。
  ///
  /// 索引越界时返回合成标签 `class_<id>` 而不是失败，以容忍在
  /// 非标准类别数上训练的模型。
  pub fn label(&self, class_id: usize) -> String {
    match self.names.get(class_id) {
      Some(name) => (*name).to_string(),
      None => format!("class_{class_id}"),
    }
  }
}
