// 该文件是 Qianli （千里眼） 项目的一部分。
// src/task.rs - 任务循环
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::SharedConfig;
use crate::frame::PlanarFrame;
use crate::input::SourceFrame;
use crate::labels::ClassCatalog;
use crate::model::{Model, RawOutput};
use crate::output::Render;
use crate::postprocess::{Detection, ImageSpace, postprocess};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 单帧任务：取一帧，推理，后处理，输出
pub struct OneShotTask {
  config: SharedConfig,
  catalog: ClassCatalog,
}

impl OneShotTask {
  pub fn new(config: SharedConfig) -> Self {
    Self {
      config,
      catalog: ClassCatalog::coco(),
    }
  }

  pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
    self.catalog = catalog;
    self
  }
}

impl<
  const W: u32,
  const H: u32,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceFrame<W, H>>,
  M: Model<Input = PlanarFrame<W, H>, Output = RawOutput, Error = ME>,
  O: Render<SourceFrame<W, H>, Vec<Detection<ImageSpace>>, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let source = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");

    let now = Instant::now();
    let raw = model.infer(&source.frame)?;
    let config = self.config.get();
    let detections = postprocess(&raw, &self.catalog, &config, &source.map);
    let elapsed = now.elapsed();
    info!("推理与后处理完成，耗时: {:.2?}", elapsed);

    output.render_result(&source, &detections)?;
    info!("输出完成");

    Ok(())
  }
}

/// 连续任务：采集线程 + 处理循环。
///
/// 每个周期是一次自包含的管线调用：取帧 → 推理 → 解码 → 抑制 →
/// 映射 → 发布。处理期间到达的新帧被丢弃而不是排队（`in_flight`
/// 守卫），循环总是处理较新的帧而不积压；单次取帧由超时兜底，
/// 慢速或停滞的采集不会无限阻塞循环。取消是协作式的，在周期之间
/// 检查中断信号。
pub struct ContinuousTask {
  config: SharedConfig,
  catalog: ClassCatalog,
  frame_number: Option<usize>,
  frame_timeout: Duration,
}

impl ContinuousTask {
  pub fn new(config: SharedConfig) -> Self {
    Self {
      config,
      catalog: ClassCatalog::coco(),
      frame_number: None,
      frame_timeout: Duration::from_secs(1),
    }
  }

  pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
    self.catalog = catalog;
    self
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_frame_timeout(mut self, frame_timeout: Duration) -> Self {
    self.frame_timeout = frame_timeout;
    self
  }
}

impl<
  const W: u32,
  const H: u32,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = SourceFrame<W, H>> + Send + 'static,
  M: Model<Input = PlanarFrame<W, H>, Output = RawOutput, Error = ME>,
  O: Render<SourceFrame<W, H>, Vec<Detection<ImageSpace>>, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = stop_tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    // 采集线程：处理期间到达的帧被丢弃，不排队
    let in_flight = Arc::new(AtomicBool::new(false));
    let (frame_tx, frame_rx) = mpsc::sync_channel::<SourceFrame<W, H>>(1);
    let capture_guard = in_flight.clone();
    let capture = thread::spawn(move || {
      for frame in input {
        if capture_guard.load(Ordering::Acquire) {
          debug!("上一帧仍在处理，丢弃新帧");
          continue;
        }
        match frame_tx.try_send(frame) {
          Ok(()) => {}
          Err(TrySendError::Full(_)) => debug!("帧通道已满，丢弃新帧"),
          Err(TrySendError::Disconnected(_)) => break,
        }
      }
    });

    let mut frame_index = 0usize;
    loop {
      if stop_rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      let source = match frame_rx.recv_timeout(self.frame_timeout) {
        Ok(source) => source,
        Err(RecvTimeoutError::Timeout) => {
          debug!("获取帧超时 ({:.2?})，跳过本轮", self.frame_timeout);
          continue;
        }
        Err(RecvTimeoutError::Disconnected) => {
          info!("输入结束");
          break;
        }
      };

      in_flight.store(true, Ordering::Release);
      frame_index = (frame_index + 1) % usize::MAX;
      info!("处理第 {} 帧图像", frame_index);

      let now = Instant::now();
      // 每帧读取一次配置快照，阈值可在运行期间更新
      let config = self.config.get();
      let result = model
        .infer(&source.frame)
        .map(|raw| postprocess(&raw, &self.catalog, &config, &source.map));
      let elapsed_a = now.elapsed();

      let result = match result {
        Ok(detections) => output.render_result(&source, &detections).map_err(Into::into),
        Err(e) => Err(anyhow::Error::from(e)),
      };
      // 取帧与置位守卫之间有一个窗口，采集线程可能已向通道塞入一帧；
      // 释放守卫前清空通道，处理期间到达的帧一律丢弃而不是顺延
      while frame_rx.try_recv().is_ok() {
        debug!("丢弃处理期间排队的帧");
      }
      in_flight.store(false, Ordering::Release);

      let elapsed_b = now.elapsed();
      info!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

      if let Err(e) = result {
        drop(frame_rx);
        let _ = capture.join();
        return Err(e);
      }

      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
    }

    drop(frame_rx);
    let _ = capture.join();

    info!("任务完成，退出");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::Infallible;
  use std::sync::Mutex;

  use crate::config::PipelineConfig;
  use crate::postprocess::CoordinateMap;

  struct FixedModel {
    raw: RawOutput,
  }

  impl Model for FixedModel {
    type Input = PlanarFrame<8, 8>;
    type Output = RawOutput;
    type Error = Infallible;

    fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
      Ok(self.raw.clone())
    }
  }

  #[derive(Default)]
  struct CollectOutput {
    results: Arc<Mutex<Vec<Vec<Detection<ImageSpace>>>>>,
  }

  impl<F> Render<F, Vec<Detection<ImageSpace>>> for CollectOutput {
    type Error = Infallible;

    fn render_result(
      &self,
      _frame: &F,
      result: &Vec<Detection<ImageSpace>>,
    ) -> Result<(), Self::Error> {
      self.results.lock().unwrap().push(result.clone());
      Ok(())
    }
  }

  fn source_frame() -> SourceFrame<8, 8> {
    SourceFrame {
      frame: PlanarFrame::default(),
      map: CoordinateMap::Uniform {
        scale_x: 1.0,
        scale_y: 1.0,
      },
    }
  }

  #[test]
  fn one_shot_runs_full_pipeline() {
    // 8 行预抑制输出，仅首行有效，其余零行被置信度过滤
    let mut data = vec![10.0, 10.0, 50.0, 60.0, 0.9, 3.0];
    data.resize(8 * 6, 0.0);
    let model = FixedModel {
      raw: RawOutput::new(data, vec![1, 8, 6]),
    };
    let output = CollectOutput::default();
    let results = output.results.clone();

    let config = SharedConfig::new(PipelineConfig::default());
    OneShotTask::new(config)
      .run_task(vec![source_frame()].into_iter(), model, output)
      .unwrap();

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].len(), 1);
    assert_eq!(results[0][0].label, "motorcycle");
  }

  /// 以固定节奏产帧的输入，模拟持续的采集源
  struct PacedInput {
    remaining: usize,
  }

  impl Iterator for PacedInput {
    type Item = SourceFrame<8, 8>;

    fn next(&mut self) -> Option<Self::Item> {
      if self.remaining == 0 {
        return None;
      }
      self.remaining -= 1;
      thread::sleep(Duration::from_millis(5));
      Some(source_frame())
    }
  }

  // ctrlc 处理器每个进程只能注册一次，连续任务只在这一个用例中运行
  #[test]
  fn continuous_task_renders_each_frame_exactly_once() {
    let mut data = vec![10.0, 10.0, 50.0, 60.0, 0.9, 3.0];
    data.resize(8 * 6, 0.0);
    let model = FixedModel {
      raw: RawOutput::new(data, vec![1, 8, 6]),
    };
    let output = CollectOutput::default();
    let results = output.results.clone();

    let config = SharedConfig::new(PipelineConfig::default());
    ContinuousTask::new(config)
      .with_frame_number(Some(3))
      .with_frame_timeout(Duration::from_secs(1))
      .run_task(PacedInput { remaining: 50 }, model, output)
      .unwrap();

    // 处理期间排队的帧被丢弃，输出条数恰好等于处理的帧数
    let results = results.lock().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.len() == 1));
  }

  #[test]
  fn one_shot_without_frames_is_an_error() {
    let model = FixedModel {
      raw: RawOutput::new(vec![], vec![1, 0, 6]),
    };
    let config = SharedConfig::new(PipelineConfig::default());
    let result = OneShotTask::new(config).run_task(
      Vec::<SourceFrame<8, 8>>::new().into_iter(),
      model,
      CollectOutput::default(),
    );
    assert!(result.is_err());
  }
}
