use std::time::{Duration, Instant};

use anyhow::Result;
use ash::vk;
use tracing::error;

use crate::allocators::Allocator;
use crate::command::{CommandList, CommandPool};
use crate::device::{ExecutionManager, Queue};
use crate::pipelines::PipelineManager;
use crate::resource::manager::{resource_name, warn_unbound_usage, ResourceManager};
use crate::resource::usage::ResourceUsage;
use crate::shader::ShaderCompiler;
use crate::GraphError;

/// Which queue family a [`TaskDesc`] needs. Aggregated across every pending task when `compile()`
/// resolves a single queue to run the whole graph on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueType {
    Graphics,
    Compute,
    Transfer,
}

impl QueueType {
    fn to_vk(self) -> vk::QueueFlags {
        match self {
            QueueType::Graphics => vk::QueueFlags::GRAPHICS,
            QueueType::Compute => vk::QueueFlags::COMPUTE,
            QueueType::Transfer => vk::QueueFlags::TRANSFER,
        }
    }
}

/// `{sim_index, delta_time, time_since_epoch}`, mutated only by [`TaskGraph::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationState {
    pub sim_index: u64,
    pub delta_time: Duration,
    pub time_since_epoch: Duration,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            sim_index: 0,
            delta_time: Duration::ZERO,
            time_since_epoch: Duration::ZERO,
        }
    }
}

/// A single-use callback that records a task's work into a [`CommandList`]. Never invoked outside
/// the `execute()` call that owns it, and never retained past [`TaskGraph::clear`].
pub type TaskExecuteFn<A, C> = Box<dyn for<'a> FnMut(&mut CommandList<'a, A, C>) -> Result<()>>;

/// Declarative description of one piece of work: the queue it wants, the resources it touches,
/// and the callback that records it.
pub struct TaskDesc<A: Allocator, C: ShaderCompiler> {
    pub name: String,
    pub queue_type: QueueType,
    pub resources: Vec<ResourceUsage>,
    pub execute_fn: TaskExecuteFn<A, C>,
}

impl<A: Allocator, C: ShaderCompiler> TaskDesc<A, C> {
    pub fn new(
        name: impl Into<String>,
        queue_type: QueueType,
        resources: Vec<ResourceUsage>,
        execute_fn: TaskExecuteFn<A, C>,
    ) -> Self {
        Self {
            name: name.into(),
            queue_type,
            resources,
            execute_fn,
        }
    }
}

struct CompiledGraph<A: Allocator, C: ShaderCompiler> {
    queue: Queue,
    command_pool: CommandPool,
    command_buffer: Option<crate::command::CommandBuffer>,
    tasks: Vec<TaskDesc<A, C>>,
}

/// Holds a list of [`TaskDesc`]s, turns them into a playable linear program via [`Self::compile`],
/// then plays that program back once per call to [`Self::execute`]. Single-threaded cooperative:
/// `compile`/`execute` run on one thread, tasks never run concurrently, and the only suspension
/// point is the wait for the submitted work to finish at the end of `execute`.
pub struct TaskGraph<A: Allocator, C: ShaderCompiler> {
    device: crate::device::LogicalDevice,
    execution_manager: ExecutionManager,
    resource_manager: ResourceManager<A>,
    pipeline_manager: PipelineManager<C>,
    sim_state: SimulationState,
    start: Option<Instant>,
    last_tick: Option<Instant>,
    pending: Vec<TaskDesc<A, C>>,
    compiled: Option<CompiledGraph<A, C>>,
}

impl<A: Allocator, C: ShaderCompiler> TaskGraph<A, C> {
    pub fn new(
        device: crate::device::LogicalDevice,
        execution_manager: ExecutionManager,
        resource_manager: ResourceManager<A>,
        pipeline_manager: PipelineManager<C>,
    ) -> Self {
        Self {
            device,
            execution_manager,
            resource_manager,
            pipeline_manager,
            sim_state: SimulationState::default(),
            start: None,
            last_tick: None,
            pending: Vec::new(),
            compiled: None,
        }
    }

    pub fn resources(&self) -> &ResourceManager<A> {
        &self.resource_manager
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager<A> {
        &mut self.resource_manager
    }

    pub fn pipelines(&self) -> &PipelineManager<C> {
        &self.pipeline_manager
    }

    pub fn pipelines_mut(&mut self) -> &mut PipelineManager<C> {
        &mut self.pipeline_manager
    }

    pub fn state(&self) -> &SimulationState {
        &self.sim_state
    }

    /// Pushes `desc` onto the pending list. Does not validate; validation happens in
    /// [`Self::compile`].
    pub fn add_task(&mut self, desc: TaskDesc<A, C>) {
        self.pending.push(desc);
    }

    /// Drops pending descriptions and any compiled record, destroying the owned command pool.
    pub fn clear(&mut self) {
        self.pending.clear();
        if let Some(mut compiled) = self.compiled.take() {
            use crate::traits::Destructible;
            compiled.command_pool.destroy();
        }
    }

    /// Deterministic compile: validate every task's declared resources, bind them all into the
    /// bindless descriptor table, resolve a single queue for the aggregate of requested queue
    /// types, and allocate the one primary command buffer the graph plays back into.
    pub fn compile(&mut self) -> Result<()> {
        for task in &self.pending {
            let mut seen: Vec<ResourceUsage> = Vec::with_capacity(task.resources.len());
            for usage in &task.resources {
                if seen.iter().any(|s| s.resource == usage.resource) {
                    error!(
                        "task \"{}\": resource used more than once in a single task",
                        task.name
                    );
                    return Err(anyhow::Error::from(GraphError::DuplicateResourceUsage));
                }
                seen.push(*usage);
            }
        }

        for task in &self.pending {
            for usage in &task.resources {
                if let Err(e) = self.resource_manager.bind_resource(*usage) {
                    error!("task \"{}\": failed to bind resource: {e}", task.name);
                    return Err(e);
                }
            }
        }

        let mut flags = vk::QueueFlags::empty();
        for task in &self.pending {
            flags |= task.queue_type.to_vk();
        }
        let queue = self
            .execution_manager
            .find_queue(flags)
            .ok_or(GraphError::ImpossibleQueue)?;

        let command_pool = CommandPool::new(
            self.device.clone(),
            &queue,
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )?;
        let alloc_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            p_next: std::ptr::null(),
            command_pool: command_pool.handle(),
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            _marker: Default::default(),
        };
        let command_buffer = command_pool
            .allocate(&alloc_info)?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("driver returned no command buffers"))?;

        self.resource_manager.flush_descriptors();

        let tasks = std::mem::take(&mut self.pending);
        self.compiled = Some(CompiledGraph {
            queue,
            command_pool,
            command_buffer: Some(command_buffer),
            tasks,
        });
        Ok(())
    }

    /// Advances [`SimulationState`], records every compiled task in declaration order into the
    /// one primary command buffer, submits it, and waits for the queue to idle before returning.
    /// A no-op if the graph has not been compiled (or was aborted).
    pub fn execute(&mut self) -> Result<()> {
        let compiled = match &mut self.compiled {
            Some(c) => c,
            None => return Ok(()),
        };

        let now = Instant::now();
        let start = *self.start.get_or_insert(now);
        self.sim_state.delta_time = match self.last_tick {
            Some(prev) => now.duration_since(prev),
            None => Duration::ZERO,
        };
        self.sim_state.time_since_epoch = now.duration_since(start);
        self.sim_state.sim_index += 1;
        self.last_tick = Some(now);

        let cmd = compiled
            .command_buffer
            .take()
            .ok_or_else(|| anyhow::anyhow!("task graph command buffer is not available"))?;
        cmd.reset(vk::CommandBufferResetFlags::empty())?;
        let recording = cmd
            .begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
            .map_err(|(_, e)| anyhow::Error::from(e))?;
        let raw_cmd = recording.handle();

        for task in compiled.tasks.iter_mut() {
            let mut list = CommandList::new(
                raw_cmd,
                self.device.clone(),
                &mut self.resource_manager,
                &mut self.pipeline_manager,
                self.sim_state,
                &task.name,
            )?;
            (task.execute_fn)(&mut list)?;
            let bound_pipelines = list.bound_pipelines().to_vec();
            list.end_debug_marker()?;
            drop(list);

            for usage in &task.resources {
                let covered = bound_pipelines.iter().any(|handle| {
                    self.pipeline_manager
                        .get_bound_resources(*handle)
                        .map(|bound| bound.contains(usage))
                        .unwrap_or(false)
                });
                if !covered {
                    warn_unbound_usage(&resource_name(&task.name, usage));
                }
            }
        }

        let executable = recording.end()?;
        let submit_info = executable.submit_info();
        let submit_infos = [crate::command::CommandBufferExecutable::submit_info_sync(
            std::slice::from_ref(&submit_info),
            &[],
            &[],
        )];
        let mut fence = crate::sync::Fence::new(self.device.clone(), vk::FenceCreateFlags::empty())?;
        let cmd = executable
            .submit(compiled.queue.handle(), &submit_infos, fence.handle())
            .map_err(|(_, e)| anyhow::Error::from(e))?;
        fence.wait(u64::MAX)?;
        {
            use crate::traits::Destructible;
            fence.destroy();
        }
        compiled.command_buffer = Some(cmd);

        Ok(())
    }
}

/// A thin extension of [`TaskGraph`] that additionally knows the swapchain image it should end
/// up in. All graph semantics are unchanged; only `execute()` brackets the underlying execution
/// with an image acquire and a present.
pub struct FrameGraph<A: Allocator, C: ShaderCompiler> {
    graph: TaskGraph<A, C>,
    output_image: crate::resource::manager::ImageHandle,
}

impl<A: Allocator, C: ShaderCompiler> FrameGraph<A, C> {
    pub fn new(graph: TaskGraph<A, C>, output_image: crate::resource::manager::ImageHandle) -> Self {
        Self {
            graph,
            output_image,
        }
    }

    pub fn output_image(&self) -> crate::resource::manager::ImageHandle {
        self.output_image
    }

    pub fn add_task(&mut self, desc: TaskDesc<A, C>) {
        self.graph.add_task(desc);
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    pub fn compile(&mut self) -> Result<()> {
        self.graph.compile()
    }

    pub fn state(&self) -> &SimulationState {
        self.graph.state()
    }

    pub fn resources_mut(&mut self) -> &mut ResourceManager<A> {
        self.graph.resources_mut()
    }

    pub fn pipelines_mut(&mut self) -> &mut PipelineManager<C> {
        self.graph.pipelines_mut()
    }

    /// Acquires a presentable swapchain image, plays back the wrapped [`TaskGraph`], blits
    /// `output_image` onto the acquired surface image, and presents it. The acquire/blit/present
    /// steps are collaborator-owned (swapchain wrapper); this core only sequences them around
    /// [`TaskGraph::execute`].
    pub fn execute<FAcquire, FPresent>(
        &mut self,
        acquire: FAcquire,
        present: FPresent,
    ) -> Result<()>
    where
        FAcquire: FnOnce() -> Result<vk::Image>,
        FPresent: FnOnce(vk::Image, crate::resource::manager::ImageHandle) -> Result<()>,
    {
        let surface_image = acquire()?;
        self.graph.execute()?;
        present(surface_image, self.output_image)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn queue_type_maps_to_distinct_flags() {
        assert_eq!(QueueType::Graphics.to_vk(), vk::QueueFlags::GRAPHICS);
        assert_eq!(QueueType::Compute.to_vk(), vk::QueueFlags::COMPUTE);
        assert_eq!(QueueType::Transfer.to_vk(), vk::QueueFlags::TRANSFER);
    }

    #[test]
    fn simulation_state_starts_at_zero() {
        let state = SimulationState::default();
        assert_eq!(state.sim_index, 0);
        assert_eq!(state.delta_time, Duration::ZERO);
        assert_eq!(state.time_since_epoch, Duration::ZERO);
    }
}
